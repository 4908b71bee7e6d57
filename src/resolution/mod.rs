//! Resolution façade
//!
//! Picks the naming service for a domain and forwards the call. Services are
//! tried in routing order (ZNS, ENS, UNS); the first whose `supports` says
//! yes serves the domain. Domains are trimmed and lower-cased here, once.

use crate::errors::{ResolutionError, Result};
use crate::namehash::{namehash, HashChain, TokenId};
use crate::services::{Location, NamingService, ServiceName, TokenMetadata};
use alloy_primitives::Address;
use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Trim and lower-case a domain.
pub fn normalize(domain: &str) -> String {
    domain.trim().to_lowercase()
}

#[derive(Clone)]
pub struct Resolution {
    services: Vec<Arc<dyn NamingService>>,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<ServiceName> = self.services.iter().map(|s| s.name()).collect();
        f.debug_struct("Resolution").field("services", &names).finish()
    }
}

impl Resolution {
    /// Services are kept in routing order whatever order they are given in.
    pub fn new(mut services: Vec<Arc<dyn NamingService>>) -> Self {
        services.sort_by_key(|s| s.name());
        Self { services }
    }

    pub fn services(&self) -> impl Iterator<Item = ServiceName> + '_ {
        self.services.iter().map(|s| s.name())
    }

    fn service_named(&self, name: ServiceName) -> Option<&dyn NamingService> {
        self.services.iter().find(|s| s.name() == name).map(|s| s.as_ref())
    }

    /// The first service in routing order that serves `domain`.
    ///
    /// The UNS check is an on-chain lookup, so routing can fail.
    async fn route(&self, domain: &str) -> Result<&dyn NamingService> {
        for service in &self.services {
            if service.supports(domain).await? {
                debug!(target: "resolution::facade", domain, service = %service.name(), "routed");
                return Ok(service.as_ref());
            }
        }
        Err(ResolutionError::UnsupportedDomain(domain.to_string()))
    }

    /// Service for a batch, judged by suffix before any network call.
    fn route_batch(&self, domains: &[String]) -> Result<Option<&dyn NamingService>> {
        let families: BTreeSet<ServiceName> = domains.iter().map(|d| ServiceName::classify(d)).collect();
        let mut families = families.into_iter();
        let Some(family) = families.next() else {
            return Ok(None);
        };
        if families.next().is_some() {
            return Err(ResolutionError::InconsistentDomainArray(domains.join(", ")));
        }
        self.service_named(family)
            .map(Some)
            .ok_or_else(|| ResolutionError::UnsupportedDomain(domains.join(", ")))
    }

    /// Name of the service that serves `domain`.
    pub async fn service_name(&self, domain: &str) -> Result<ServiceName> {
        Ok(self.route(&normalize(domain)).await?.name())
    }

    /// Token id of `domain`, hashed with its family's chain.
    ///
    /// Pure: the family is judged by suffix.
    pub fn namehash(&self, domain: &str) -> TokenId {
        let domain = normalize(domain);
        let chain = match ServiceName::classify(&domain) {
            ServiceName::Zns => HashChain::Sha256,
            ServiceName::Ens | ServiceName::Uns => HashChain::Keccak,
        };
        namehash(&domain, chain)
    }

    /// Whether any configured service serves `domain`.
    ///
    /// Unlike most predicates this performs network I/O for UNS domains and
    /// can fail.
    pub async fn is_supported(&self, domain: &str) -> Result<bool> {
        match self.route(&normalize(domain)).await {
            Ok(_) => Ok(true),
            Err(ResolutionError::UnsupportedDomain(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn owner(&self, domain: &str) -> Result<Address> {
        let domain = normalize(domain);
        self.route(&domain).await?.owner(&domain).await
    }

    /// Owners of domains of one family; unregistered domains map to `None`.
    pub async fn batch_owners(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Address>>> {
        let domains: Vec<String> = domains.iter().map(|d| normalize(d)).collect();
        match self.route_batch(&domains)? {
            Some(service) => service.batch_owners(&domains).await,
            None => Ok(BTreeMap::new()),
        }
    }

    pub async fn resolver(&self, domain: &str) -> Result<Address> {
        let domain = normalize(domain);
        self.route(&domain).await?.resolver(&domain).await
    }

    pub async fn record(&self, domain: &str, key: &str) -> Result<String> {
        let domain = normalize(domain);
        self.route(&domain).await?.record(&domain, key).await
    }

    pub async fn records(&self, domain: &str, keys: &[String]) -> Result<BTreeMap<String, String>> {
        let domain = normalize(domain);
        self.route(&domain).await?.records(&domain, keys).await
    }

    pub async fn addr(&self, domain: &str, ticker: &str) -> Result<String> {
        let domain = normalize(domain);
        self.route(&domain).await?.addr(&domain, ticker).await
    }

    pub async fn token_uri(&self, domain: &str) -> Result<String> {
        let domain = normalize(domain);
        self.route(&domain).await?.token_uri(&domain).await
    }

    pub async fn token_uri_metadata(&self, domain: &str) -> Result<TokenMetadata> {
        let domain = normalize(domain);
        self.route(&domain).await?.token_uri_metadata(&domain).await
    }

    /// Plain-text domain of a token id in `service`.
    pub async fn unhash(&self, token: TokenId, service: ServiceName) -> Result<String> {
        self.service_named(service)
            .ok_or_else(|| ResolutionError::UnsupportedNetwork(service.to_string()))?
            .unhash(token)
            .await
    }

    /// Domains owned by `owner`, across every service that indexes ownership.
    pub async fn domains_owned_by(&self, owner: Address) -> Result<Vec<String>> {
        let lookups = join_all(self.services.iter().map(|s| s.domains_owned_by(owner))).await;
        let mut owned = BTreeSet::new();
        for lookup in lookups {
            match lookup {
                Ok(domains) => owned.extend(domains),
                Err(ResolutionError::MethodNotSupported { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(owned.into_iter().collect())
    }

    /// Locations of domains of one family; unregistered domains map to `None`.
    pub async fn locations(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Location>>> {
        let domains: Vec<String> = domains.iter().map(|d| normalize(d)).collect();
        match self.route_batch(&domains)? {
            Some(service) => service.locations(&domains).await,
            None => Ok(BTreeMap::new()),
        }
    }

    /// Token id of the domain `address` set as its reverse record.
    pub async fn reverse_token_id(&self, address: Address) -> Result<TokenId> {
        self.service_named(ServiceName::Uns)
            .ok_or_else(|| ResolutionError::UnsupportedNetwork(ServiceName::Uns.to_string()))?
            .reverse_token_id(address)
            .await
    }

    /// Domain `address` set as its reverse record.
    pub async fn reverse(&self, address: Address) -> Result<String> {
        let token = self.reverse_token_id(address).await?;
        self.unhash(token, ServiceName::Uns).await
    }
}
