//! Ethereum Name Service
//!
//! Owner and resolver come from the ENS registry; records from the resolver
//! contract the registry points at. Only the ETH address is resolvable.

use super::{
    crypto_address_key, non_empty_record, not_supported, Location, NamingService, ServiceName,
    TokenMetadata, ENS_TLDS,
};
use crate::abi::{Abi, AbiValue};
use crate::errors::{ResolutionError, Result};
use crate::namehash::{namehash, HashChain, TokenId};
use crate::onchain::{non_zero, Contract};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

fn node(domain: &str) -> AbiValue {
    namehash(domain, HashChain::Keccak).as_b256().into()
}

#[derive(Debug, Clone)]
pub struct Ens {
    registry: Contract,
    resolver_abi: Arc<Abi>,
}

impl Ens {
    pub fn new(registry: Contract, resolver_abi: Arc<Abi>) -> Self {
        Self { registry, resolver_abi }
    }

    /// `name.tld` with `tld` one of the ENS TLDs.
    pub fn matches_suffix(domain: &str) -> bool {
        domain
            .rsplit_once('.')
            .is_some_and(|(name, tld)| !name.is_empty() && ENS_TLDS.contains(&tld))
    }

    async fn registry_address(&self, function: &str, domain: &str) -> Result<Option<Address>> {
        let decoded = self.registry.call(function, &[node(domain)]).await?;
        Ok(decoded.at(0).and_then(AbiValue::as_address).and_then(non_zero))
    }

    /// The resolver contract of a registered domain.
    async fn resolver_contract(&self, domain: &str) -> Result<Contract> {
        let resolver = self.resolver(domain).await?;
        Ok(Contract::new(resolver, self.resolver_abi.clone(), self.registry.provider().clone()))
    }
}

#[async_trait]
impl NamingService for Ens {
    fn name(&self) -> ServiceName {
        ServiceName::Ens
    }

    async fn supports(&self, domain: &str) -> Result<bool> {
        Ok(Self::matches_suffix(domain))
    }

    fn namehash(&self, domain: &str) -> TokenId {
        namehash(domain, HashChain::Keccak)
    }

    async fn owner(&self, domain: &str) -> Result<Address> {
        self.registry_address("owner", domain)
            .await?
            .ok_or_else(|| ResolutionError::UnregisteredDomain(domain.to_string()))
    }

    async fn batch_owners(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Address>>> {
        let args: Vec<Vec<AbiValue>> = domains.iter().map(|d| vec![node(d)]).collect();
        let owners = self.registry.call_batch("owner", &args).await?;
        Ok(domains
            .iter()
            .zip(owners)
            .map(|(domain, (_, decoded))| {
                let owner = decoded.and_then(|d| d.at(0).and_then(AbiValue::as_address)).and_then(non_zero);
                (domain.clone(), owner)
            })
            .collect())
    }

    async fn resolver(&self, domain: &str) -> Result<Address> {
        if let Some(resolver) = self.registry_address("resolver", domain).await? {
            return Ok(resolver);
        }
        // tell an unconfigured domain apart from an unregistered one
        self.owner(domain).await?;
        Err(ResolutionError::UnspecifiedResolver(domain.to_string()))
    }

    async fn record(&self, domain: &str, key: &str) -> Result<String> {
        let resolver = self.resolver_contract(domain).await?;
        let decoded = resolver.call("text", &[node(domain), AbiValue::from(key)]).await?;
        non_empty_record(domain, key, decoded.at(0).and_then(AbiValue::as_str).map(str::to_owned))
    }

    async fn records(&self, domain: &str, keys: &[String]) -> Result<BTreeMap<String, String>> {
        let resolver = self.resolver_contract(domain).await?;
        let args: Vec<Vec<AbiValue>> = keys
            .iter()
            .map(|k| vec![node(domain), AbiValue::from(k.as_str())])
            .collect();
        let values = resolver.call_batch("text", &args).await?;
        Ok(keys
            .iter()
            .zip(values)
            .map(|(key, (_, decoded))| {
                let value = decoded
                    .and_then(|d| d.at(0).and_then(AbiValue::as_str).map(str::to_owned))
                    .unwrap_or_default();
                (key.clone(), value)
            })
            .collect())
    }

    async fn addr(&self, domain: &str, ticker: &str) -> Result<String> {
        let key = crypto_address_key(ticker);
        if !ticker.trim().eq_ignore_ascii_case("eth") {
            return Err(ResolutionError::RecordNotSupported(key));
        }
        let resolver = self.resolver_contract(domain).await?;
        let decoded = resolver.call("addr", &[node(domain)]).await?;
        decoded
            .at(0)
            .and_then(AbiValue::as_address)
            .and_then(non_zero)
            .map(|addr| addr.to_checksum(None))
            .ok_or(ResolutionError::RecordNotFound { domain: domain.to_string(), key })
    }

    async fn token_uri(&self, _domain: &str) -> Result<String> {
        Err(not_supported("token_uri", ServiceName::Ens))
    }

    async fn token_uri_metadata(&self, _domain: &str) -> Result<TokenMetadata> {
        Err(not_supported("token_uri_metadata", ServiceName::Ens))
    }

    async fn unhash(&self, _token: TokenId) -> Result<String> {
        Err(not_supported("unhash", ServiceName::Ens))
    }

    async fn domains_owned_by(&self, _owner: Address) -> Result<Vec<String>> {
        Err(not_supported("domains_owned_by", ServiceName::Ens))
    }

    async fn locations(&self, _domains: &[String]) -> Result<BTreeMap<String, Option<Location>>> {
        Err(not_supported("locations", ServiceName::Ens))
    }

    async fn reverse_token_id(&self, _address: Address) -> Result<TokenId> {
        Err(not_supported("reverse_token_id", ServiceName::Ens))
    }
}
