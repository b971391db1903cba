use crate::data_sync::refresh::spawn_periodic;
use arc_swap::ArcSwapOption;
use eyre::{Result, eyre};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Reads `account_number` and `sequence` from an auth module response.
/// Ethermint accounts nest them under `base_account`.
pub fn parse_account(body: &Value) -> Result<AccountInfo> {
    let account = body.get("account").ok_or_else(|| eyre!("Response has no account"))?;
    let base = account.get("base_account").unwrap_or(account);

    let field = |name: &str| -> Result<u64> {
        match base.get(name) {
            Some(Value::String(value)) => value.parse().map_err(|e| eyre!("Invalid {}: {}", name, e)),
            Some(Value::Number(value)) => value.as_u64().ok_or_else(|| eyre!("Invalid {}: {}", name, value)),
            _ => Err(eyre!("Account has no {}", name)),
        }
    };

    Ok(AccountInfo { account_number: field("account_number")?, sequence: field("sequence")? })
}

/// Last known account number and sequence of the payment signer
pub struct AccountWatcher {
    http_client: reqwest::Client,
    rest_url: String,
    address: String,
    current: ArcSwapOption<AccountInfo>,
}

impl AccountWatcher {
    pub fn new(rest_url: impl Into<String>, address: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, rest_url: rest_url.into(), address: address.into(), current: ArcSwapOption::empty() })
    }

    pub fn account_url(&self) -> String {
        format!("{}/cosmos/auth/v1beta1/accounts/{}", self.rest_url.trim_end_matches('/'), self.address)
    }

    /// `None` until the first successful fetch
    pub fn current(&self) -> Option<AccountInfo> {
        self.current.load_full().map(|info| *info)
    }

    pub fn set(&self, info: AccountInfo) {
        self.current.store(Some(Arc::new(info)));
    }

    pub async fn refresh(&self) -> Result<AccountInfo> {
        let body: Value = self.http_client.get(self.account_url()).send().await?.error_for_status()?.json().await?;
        let info = parse_account(&body)?;
        self.set(info);
        debug!(address = %self.address, sequence = info.sequence, "Account refreshed");
        Ok(info)
    }

    pub fn spawn(self: &Arc<Self>, interval: Duration, retry_delay: Duration) -> JoinHandle<()> {
        let watcher = self.clone();
        spawn_periodic("account".to_string(), interval, retry_delay, move || {
            let watcher = watcher.clone();
            async move { watcher.refresh().await.map(|_| ()) }
        })
    }
}
