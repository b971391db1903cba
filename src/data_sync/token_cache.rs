use super::multicall::{IERC20, MulticallManager};
use crate::utils::{Token, TokenWrapper};
use alloy_primitives::Address;
use dashmap::DashMap;
use eyre::{Result, eyre};
use std::sync::Arc;
use tracing::debug;

/// Token metadata resolved once per address
pub struct TokenCache {
    multicall: MulticallManager,
    tokens: DashMap<Address, TokenWrapper>,
}

impl TokenCache {
    pub fn new(multicall: MulticallManager) -> Self {
        Self { multicall, tokens: DashMap::new() }
    }

    pub fn get(&self, address: &Address) -> Option<TokenWrapper> {
        self.tokens.get(address).map(|token| token.value().clone())
    }

    pub fn insert(&self, token: Token) -> TokenWrapper {
        self.tokens.entry(token.get_address()).or_insert_with(|| Arc::new(token)).value().clone()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the cached token or reads `name`, `symbol` and `decimals` in one batch.
    /// `decimals` must answer; `name` and `symbol` may not.
    pub async fn get_or_fetch(&self, address: Address) -> Result<TokenWrapper> {
        if let Some(token) = self.get(&address) {
            return Ok(token);
        }

        let calls = vec![
            MulticallManager::prepare_call(address, &IERC20::nameCall {}),
            MulticallManager::prepare_call(address, &IERC20::symbolCall {}),
            MulticallManager::prepare_call(address, &IERC20::decimalsCall {}),
        ];
        let results = self.multicall.aggregate3(calls).await?;

        let name = MulticallManager::decode_result::<IERC20::nameCall>(&results[0]);
        let symbol = MulticallManager::decode_result::<IERC20::symbolCall>(&results[1]);
        let decimals = MulticallManager::decode_result::<IERC20::decimalsCall>(&results[2])
            .ok_or_else(|| eyre!("Token {} does not report decimals", address))?;

        debug!(%address, ?symbol, decimals, "Loaded token");
        Ok(self.insert(Token::new_with_data(address, symbol, name, Some(decimals))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::mock_chain::MockChainReader;

    const MULTICALL: Address = Address::repeat_byte(0xca);

    #[tokio::test]
    async fn test_get_or_fetch() -> Result<()> {
        let token = Address::repeat_byte(0x0a);
        let chain = Arc::new(MockChainReader::new(MULTICALL));
        chain.set_call_return(token, &IERC20::symbolCall {}, &"WEVMOS".to_string());
        chain.set_call_return(token, &IERC20::decimalsCall {}, &18u8);
        let cache = TokenCache::new(MulticallManager::new(MULTICALL, chain.clone()));

        let loaded = cache.get_or_fetch(token).await?;
        assert_eq!(loaded.get_symbol(), "WEVMOS");
        assert_eq!(loaded.get_decimals(), 18);

        let again = cache.get_or_fetch(token).await?;
        assert!(Arc::ptr_eq(&loaded, &again));
        assert_eq!(chain.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_decimals_are_required() {
        let token = Address::repeat_byte(0x0b);
        let chain = Arc::new(MockChainReader::new(MULTICALL));
        chain.set_call_return(token, &IERC20::symbolCall {}, &"BAD".to_string());
        let cache = TokenCache::new(MulticallManager::new(MULTICALL, chain));

        assert!(cache.get_or_fetch(token).await.is_err());
        assert!(cache.is_empty());
    }
}
