use super::signer::{BundleSigner, ExecutionError, TransactionSigner};
use crate::data_sync::config::CosmosConfig;
use alloy_primitives::{Address, Bytes, U256, keccak256};
use bech32::{Bech32, Hrp};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use prost::Message;

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const ETH_SECP256K1_PUBKEY_TYPE_URL: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";
pub const SIGN_MODE_DIRECT: i32 = 1;

#[derive(Clone, PartialEq, Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ModeInfoSingle {
    #[prost(int32, tag = "1")]
    pub mode: i32,
}

/// Only the `single` branch of the oneof is ever produced
#[derive(Clone, PartialEq, Message)]
pub struct ModeInfo {
    #[prost(message, optional, tag = "1")]
    pub single: Option<ModeInfoSingle>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// Bech32 form of an account address
pub fn bech32_address(prefix: &str, address: Address) -> Result<String, ExecutionError> {
    let hrp = Hrp::parse(prefix).map_err(|e| ExecutionError::Encoding(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, address.as_slice()).map_err(|e| ExecutionError::Encoding(e.to_string()))
}

/// The bot's secp256k1 key as seen from the Cosmos side
#[derive(Clone)]
pub struct CosmosKey {
    key: SigningKey,
}

impl CosmosKey {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ExecutionError> {
        SigningKey::from_slice(bytes).map(Self::new).map_err(|e| ExecutionError::Signing(e.to_string()))
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Same address the EVM side derives for this key
    pub fn address(&self) -> Address {
        alloy_signer::utils::public_key_to_address(self.key.verifying_key())
    }

    pub fn bech32_address(&self, prefix: &str) -> Result<String, ExecutionError> {
        bech32_address(prefix, self.address())
    }

    /// Ethermint signature: keccak256 digest, 65 bytes `r || s || v`
    pub fn sign_keccak(&self, payload: &[u8]) -> Result<Vec<u8>, ExecutionError> {
        let digest = keccak256(payload);
        let (signature, recovery_id) =
            self.key.sign_prehash_recoverable(digest.as_slice()).map_err(|e| ExecutionError::Signing(e.to_string()))?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        Ok(bytes)
    }
}

impl BundleSigner for CosmosKey {
    fn public_key(&self) -> Vec<u8> {
        self.key.verifying_key().to_encoded_point(true).as_bytes().to_vec()
    }

    /// Plain secp256k1 over sha256, 64 bytes `r || s`
    fn sign_bundle(&self, payload: &[u8]) -> Result<Vec<u8>, ExecutionError> {
        let signature: Signature = self.key.try_sign(payload).map_err(|e| ExecutionError::Signing(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    pub amount: U256,
    pub account_number: u64,
    pub sequence: u64,
}

/// Signs the bank transfer that pays the bid to the auction house
#[derive(Clone)]
pub struct CosmosPaymentSigner {
    key: CosmosKey,
    from_address: String,
    to_address: String,
    config: CosmosConfig,
}

impl CosmosPaymentSigner {
    pub fn new(key: CosmosKey, to_address: impl Into<String>, config: CosmosConfig) -> Result<Self, ExecutionError> {
        let from_address = key.bech32_address(&config.bech32_prefix)?;
        Ok(Self { key, from_address, to_address: to_address.into(), config })
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn key(&self) -> &CosmosKey {
        &self.key
    }

    fn coin(&self, amount: String) -> Coin {
        Coin { denom: self.config.denom.clone(), amount }
    }

    fn body(&self, amount: U256) -> TxBody {
        let msg = MsgSend {
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            amount: vec![self.coin(amount.to_string())],
        };
        TxBody {
            messages: vec![Any { type_url: MSG_SEND_TYPE_URL.to_string(), value: msg.encode_to_vec() }],
            memo: String::new(),
            timeout_height: 0,
        }
    }

    fn auth_info(&self, sequence: u64) -> AuthInfo {
        let public_key = Any {
            type_url: ETH_SECP256K1_PUBKEY_TYPE_URL.to_string(),
            value: PubKey { key: self.key.public_key() }.encode_to_vec(),
        };
        AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: Some(public_key),
                mode_info: Some(ModeInfo { single: Some(ModeInfoSingle { mode: SIGN_MODE_DIRECT }) }),
                sequence,
            }],
            fee: Some(Fee {
                amount: vec![self.coin(self.config.fee_amount.clone())],
                gas_limit: self.config.gas_limit,
                payer: String::new(),
                granter: String::new(),
            }),
        }
    }
}

impl TransactionSigner for CosmosPaymentSigner {
    type Request = PaymentRequest;

    fn sender(&self) -> Address {
        self.key.address()
    }

    fn sign_transaction(&self, request: &PaymentRequest) -> Result<Bytes, ExecutionError> {
        let body_bytes = self.body(request.amount).encode_to_vec();
        let auth_info_bytes = self.auth_info(request.sequence).encode_to_vec();
        let sign_doc = SignDoc {
            body_bytes: body_bytes.clone(),
            auth_info_bytes: auth_info_bytes.clone(),
            chain_id: self.config.chain_id.clone(),
            account_number: request.account_number,
        };
        let signature = self.key.sign_keccak(&sign_doc.encode_to_vec())?;
        Ok(TxRaw { body_bytes, auth_info_bytes, signatures: vec![signature] }.encode_to_vec().into())
    }
}
