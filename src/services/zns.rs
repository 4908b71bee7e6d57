//! Zilliqa Name Service
//!
//! Zilliqa contracts are not EVM contracts: state is read field by field
//! with `GetSmartContractSubState`. The registry's `records` map holds
//! `Record(owner, resolver)` per node; a resolver's `records` map holds the
//! key/value records.

use super::{
    crypto_address_key, non_empty_record, not_supported, Location, NamingService, ServiceName,
    TokenMetadata,
};
use crate::errors::{ResolutionError, Result};
use crate::namehash::{namehash, HashChain, TokenId};
use crate::onchain::{non_zero, RpcProvider};
use crate::orchestrator::join_keyed;
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Zns {
    provider: Arc<RpcProvider>,
    registry: Address,
}

/// Zilliqa addresses are sent as bare lowercase hex.
fn bare_hex(address: Address) -> String {
    format!("{address:x}")
}

fn parse_address(value: &Value) -> Option<Address> {
    value.as_str().and_then(|s| s.parse().ok()).and_then(non_zero)
}

impl Zns {
    pub fn new(provider: Arc<RpcProvider>, registry: Address) -> Self {
        Self { provider, registry }
    }

    /// `zil` itself, or anything under it.
    pub fn matches_suffix(domain: &str) -> bool {
        domain == "zil" || domain.ends_with(".zil")
    }

    async fn sub_state(&self, contract: Address, field: &str, indices: Vec<String>) -> Result<Value> {
        debug!(target: "resolution::zns", contract = %contract, field, "GetSmartContractSubState");
        self.provider
            .request("GetSmartContractSubState", json!([bare_hex(contract), field, indices]))
            .await
    }

    /// Owner and resolver of `domain` from the registry.
    async fn registry_record(&self, domain: &str) -> Result<(Option<Address>, Option<Address>)> {
        let node = namehash(domain, HashChain::Sha256).to_hex();
        let state = self.sub_state(self.registry, "records", vec![node.clone()]).await?;
        let arguments = &state["records"][&node]["arguments"];
        Ok((parse_address(&arguments[0]), parse_address(&arguments[1])))
    }

    /// Every record of the domain's resolver.
    async fn resolver_records(&self, domain: &str) -> Result<BTreeMap<String, String>> {
        let resolver = self.resolver(domain).await?;
        let state = self.sub_state(resolver, "records", Vec::new()).await?;
        let records = state["records"]
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }
}

#[async_trait]
impl NamingService for Zns {
    fn name(&self) -> ServiceName {
        ServiceName::Zns
    }

    async fn supports(&self, domain: &str) -> Result<bool> {
        Ok(Self::matches_suffix(domain))
    }

    fn namehash(&self, domain: &str) -> TokenId {
        namehash(domain, HashChain::Sha256)
    }

    async fn owner(&self, domain: &str) -> Result<Address> {
        self.registry_record(domain)
            .await?
            .0
            .ok_or_else(|| ResolutionError::UnregisteredDomain(domain.to_string()))
    }

    async fn batch_owners(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Address>>> {
        let owners = join_keyed(domains.iter().map(|d| (d.clone(), self.owner(d)))).await;
        owners
            .into_iter()
            .map(|(domain, owner)| match owner {
                Ok(owner) => Ok((domain, Some(owner))),
                Err(err) if err.is_unregistered() => Ok((domain, None)),
                Err(err) => Err(err),
            })
            .collect()
    }

    async fn resolver(&self, domain: &str) -> Result<Address> {
        match self.registry_record(domain).await? {
            (None, _) => Err(ResolutionError::UnregisteredDomain(domain.to_string())),
            (Some(_), None) => Err(ResolutionError::UnspecifiedResolver(domain.to_string())),
            (Some(_), Some(resolver)) => Ok(resolver),
        }
    }

    async fn record(&self, domain: &str, key: &str) -> Result<String> {
        let mut records = self.resolver_records(domain).await?;
        non_empty_record(domain, key, records.remove(key))
    }

    async fn records(&self, domain: &str, keys: &[String]) -> Result<BTreeMap<String, String>> {
        let mut all = self.resolver_records(domain).await?;
        Ok(keys
            .iter()
            .map(|k| (k.clone(), all.remove(k).unwrap_or_default()))
            .collect())
    }

    async fn addr(&self, domain: &str, ticker: &str) -> Result<String> {
        self.record(domain, &crypto_address_key(ticker)).await
    }

    async fn token_uri(&self, _domain: &str) -> Result<String> {
        Err(not_supported("token_uri", ServiceName::Zns))
    }

    async fn token_uri_metadata(&self, _domain: &str) -> Result<TokenMetadata> {
        Err(not_supported("token_uri_metadata", ServiceName::Zns))
    }

    async fn unhash(&self, _token: TokenId) -> Result<String> {
        Err(not_supported("unhash", ServiceName::Zns))
    }

    async fn domains_owned_by(&self, _owner: Address) -> Result<Vec<String>> {
        Err(not_supported("domains_owned_by", ServiceName::Zns))
    }

    async fn locations(&self, _domains: &[String]) -> Result<BTreeMap<String, Option<Location>>> {
        Err(not_supported("locations", ServiceName::Zns))
    }

    async fn reverse_token_id(&self, _address: Address) -> Result<TokenId> {
        Err(not_supported("reverse_token_id", ServiceName::Zns))
    }
}
