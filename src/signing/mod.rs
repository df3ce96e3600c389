//! Wallet credentials, signing, and CLOB authentication.
//!
//! Signers are cached per private key so repeated ticks do not re-derive them.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use once_cell::sync::Lazy;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::Normal;
use polymarket_client_sdk::clob::types::SignatureType;
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::Address;
use polymarket_client_sdk::POLYGON;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::TradingError;

/// CLOB client holding derived API credentials.
pub type AuthenticatedClob = Client<Authenticated<Normal>>;

/// Signer cache keyed by a hash of the private key.
static SIGNER_CACHE: Lazy<RwLock<HashMap<u64, PrivateKeySigner>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn key_hash(private_key: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    private_key.hash(&mut hasher);
    hasher.finish()
}

/// Convert a u8 signature type from config to SDK SignatureType.
///
/// - 0: EOA (Externally Owned Account) - standard wallet
/// - 1: Magic.link - proxy wallet
/// - 2: Gnosis Safe - multi-sig
pub fn signature_type_from_u8(sig_type: u8) -> SignatureType {
    match sig_type {
        1 => SignatureType::Proxy,
        2 => SignatureType::GnosisSafe,
        _ => SignatureType::Eoa,
    }
}

/// Create a LocalSigner from a hex-encoded private key, with or without "0x".
pub fn create_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    let key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(key)
        .map_err(|e| TradingError::SigningError(format!("Invalid private key hex: {}", e)))?;

    let key_bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        TradingError::SigningError(format!("Private key must be 32 bytes, got {}", bytes.len()))
    })?;

    PrivateKeySigner::from_bytes(&key_bytes.into())
        .map_err(|e| TradingError::SigningError(format!("Failed to create signer: {}", e)))
}

/// Get or create a cached signer for the given private key.
pub fn get_or_create_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    let hash = key_hash(private_key);

    {
        let cache = SIGNER_CACHE.read().map_err(|e| {
            TradingError::SigningError(format!("Failed to acquire cache read lock: {}", e))
        })?;
        if let Some(signer) = cache.get(&hash) {
            return Ok(signer.clone());
        }
    }

    let signer = create_signer(private_key)?;
    let mut cache = SIGNER_CACHE.write().map_err(|e| {
        TradingError::SigningError(format!("Failed to acquire cache write lock: {}", e))
    })?;
    debug!("Caching new signer");
    Ok(cache.entry(hash).or_insert(signer).clone())
}

/// Get the wallet address from a private key.
pub fn address_from_private_key(private_key: &str) -> Result<String, TradingError> {
    let signer = create_signer(private_key)?;
    Ok(format!("{:?}", signer.address()))
}

/// Trading credentials taken from [`Config`] at startup.
#[derive(Clone)]
pub struct Credentials {
    private_key: String,
    signature_type: u8,
    funder: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"<redacted>")
            .field("signature_type", &self.signature_type)
            .field("funder", &self.funder)
            .finish()
    }
}

impl Credentials {
    /// Collect credentials from config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            private_key: config.polymarket_private_key.clone(),
            signature_type: config.polymarket_signature_type,
            funder: config.polymarket_funder.clone(),
        }
    }

    /// SDK view of the signature type.
    pub fn sdk_signature_type(&self) -> SignatureType {
        signature_type_from_u8(self.signature_type)
    }

    /// Proxy wallet holding the funds; `None` when the signer trades directly.
    pub fn funder_address(&self) -> Result<Option<Address>, TradingError> {
        match &self.funder {
            Some(funder) if self.signature_type != 0 => Address::from_str(funder)
                .map(Some)
                .map_err(|e| TradingError::SigningError(format!("Invalid funder address {}: {}", funder, e))),
            _ => Ok(None),
        }
    }

    /// Address derived from the private key.
    pub fn signer_address(&self) -> Result<String, TradingError> {
        let signer = get_or_create_signer(&self.private_key)?;
        Ok(format!("{:?}", signer.address()))
    }

    /// Cached signer bound to the Polygon chain id, used for order signatures.
    pub fn order_signer(&self) -> Result<PrivateKeySigner, TradingError> {
        Ok(get_or_create_signer(&self.private_key)?.with_chain_id(Some(POLYGON)))
    }

    /// Create or derive API credentials and return an authenticated CLOB client.
    pub async fn authenticate(&self, clob_url: &str) -> Result<AuthenticatedClob, TradingError> {
        let signer = self.order_signer()?;
        let clob_config = ClobConfig::builder().use_server_time(true).build();

        let mut builder = Client::new(clob_url, clob_config)
            .map_err(|e| TradingError::AuthFailed(format!("Failed to create CLOB client: {}", e)))?
            .authentication_builder(&signer);
        if let Some(funder) = self.funder_address()? {
            builder = builder
                .funder(funder)
                .signature_type(self.sdk_signature_type());
        }

        let client = builder
            .authenticate()
            .await
            .map_err(|e| TradingError::AuthFailed(e.to_string()))?;

        info!(
            address = %signer.address(),
            signature_type = self.signature_type,
            "CLOB client authenticated"
        );
        Ok(client)
    }
}
