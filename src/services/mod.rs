//! Naming-service adapters
//!
//! One trait, three families:
//! - `Uns`: ProxyReader-backed registries on L1 and L2, merged per operation
//! - `Ens`: the `.eth` registry and its resolvers
//! - `Zns`: the Zilliqa registry, read through contract sub-state
//!
//! Every operation is present on every adapter; a family that cannot serve
//! one returns `MethodNotSupported`.

pub mod ens;
pub mod uns;
pub mod zns;

pub use ens::Ens;
pub use uns::{Uns, UnsLayer};
pub use zns::Zns;

use crate::constants::CRYPTO_ADDRESS_KEY;
use crate::errors::{ResolutionError, Result};
use crate::namehash::TokenId;
use crate::onchain::Transport;
use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Naming-service families; ordered by routing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceName {
    Zns,
    Ens,
    Uns,
}

/// TLDs served by the ENS registry.
pub const ENS_TLDS: [&str; 5] = ["eth", "luxe", "kred", "xyz", "reverse"];

impl ServiceName {
    /// Family a domain belongs to, judged by its suffix alone.
    ///
    /// UNS is the catch-all: its TLD set lives on-chain.
    pub fn classify(domain: &str) -> Self {
        if Zns::matches_suffix(domain) {
            ServiceName::Zns
        } else if Ens::matches_suffix(domain) {
            ServiceName::Ens
        } else {
            ServiceName::Uns
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Zns => "ZNS",
            ServiceName::Ens => "ENS",
            ServiceName::Uns => "UNS",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner, resolver and record values of one domain.
///
/// `owner == None` means unregistered; a registered domain without a
/// resolver has `resolver == None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainData {
    pub owner: Option<Address>,
    pub resolver: Option<Address>,
    pub records: BTreeMap<String, String>,
}

/// Where a domain lives: registry, resolver and chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub registry_address: Address,
    pub resolver_address: Option<Address>,
    pub network_id: u64,
    pub blockchain: String,
    pub owner_address: Address,
    pub blockchain_provider_url: String,
}

/// ERC-721 metadata document behind a token URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Value>,
}

/// Record key holding the address of `ticker`, e.g. `crypto.ETH.address`.
pub fn crypto_address_key(ticker: &str) -> String {
    CRYPTO_ADDRESS_KEY.replace("{}", &ticker.trim().to_uppercase())
}

/// Fetch and parse the metadata document at `uri`.
pub(crate) async fn fetch_metadata(transport: &dyn Transport, uri: &str) -> Result<TokenMetadata> {
    let body = transport.get(uri).await?;
    serde_json::from_value(body)
        .map_err(|e| ResolutionError::DecodingError(format!("token metadata at {uri}: {e}")))
}

/// Value of `key`, or `RecordNotFound` when it is empty.
pub(crate) fn non_empty_record(domain: &str, key: &str, value: Option<String>) -> Result<String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| ResolutionError::RecordNotFound {
        domain: domain.to_string(),
        key: key.to_string(),
    })
}

/// A naming-service family.
///
/// Domains are expected trimmed and lower-cased; the façade does both.
#[async_trait]
pub trait NamingService: Send + Sync {
    fn name(&self) -> ServiceName;

    /// Whether this family serves `domain`.
    ///
    /// For UNS this is a live on-chain lookup and can fail.
    async fn supports(&self, domain: &str) -> Result<bool>;

    /// Token id of `domain` under this family's hash chain.
    fn namehash(&self, domain: &str) -> TokenId;

    async fn owner(&self, domain: &str) -> Result<Address>;

    /// Owners of several domains; unregistered domains map to `None`.
    async fn batch_owners(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Address>>>;

    async fn resolver(&self, domain: &str) -> Result<Address>;

    async fn record(&self, domain: &str, key: &str) -> Result<String>;

    /// Values of `keys`; missing records come back as empty strings.
    async fn records(&self, domain: &str, keys: &[String]) -> Result<BTreeMap<String, String>>;

    /// Address of `ticker`, e.g. `ETH` or `BTC`.
    async fn addr(&self, domain: &str, ticker: &str) -> Result<String>;

    async fn token_uri(&self, domain: &str) -> Result<String>;

    async fn token_uri_metadata(&self, domain: &str) -> Result<TokenMetadata>;

    /// Plain-text domain of a token id.
    async fn unhash(&self, token: TokenId) -> Result<String>;

    async fn domains_owned_by(&self, owner: Address) -> Result<Vec<String>>;

    /// Locations of several domains; unregistered domains map to `None`.
    async fn locations(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Location>>>;

    /// Token id of the primary domain `address` configured for itself.
    async fn reverse_token_id(&self, address: Address) -> Result<TokenId>;
}

pub(crate) fn not_supported(method: &'static str, service: ServiceName) -> ResolutionError {
    ResolutionError::MethodNotSupported { method, service: service.as_str() }
}
