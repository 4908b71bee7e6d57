//! Unstoppable Name Service
//!
//! Each layer is read through its ProxyReader, which fronts the UNS registry
//! and, on L1, the legacy CNS registry. Both layers are always queried and
//! merged by the orchestrator.

use super::{
    crypto_address_key, fetch_metadata, non_empty_record, DomainData, Location, NamingService,
    ServiceName, TokenMetadata,
};
use crate::abi::AbiValue;
use crate::errors::{ResolutionError, Result};
use crate::namehash::{namehash, HashChain, TokenId};
use crate::onchain::{non_zero, Contract, RpcProvider, Transport};
use crate::orchestrator::{join_layers, merge_keyed, run_layers, Layer};
use crate::reverse::{RegistrySource, ReverseIndex};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

fn unregistered(domain: &str) -> ResolutionError {
    ResolutionError::UnregisteredDomain(domain.to_string())
}

fn token_arg(domain: &str) -> AbiValue {
    AbiValue::Uint(namehash(domain, HashChain::Keccak).as_u256())
}

/// UNS contracts on one chain.
#[derive(Debug, Clone)]
pub struct UnsLayer {
    layer: Layer,
    network_id: u64,
    blockchain: String,
    provider: Arc<RpcProvider>,
    proxy_reader: Option<Contract>,
    reverse: ReverseIndex,
}

impl UnsLayer {
    pub fn new(
        layer: Layer,
        network_id: u64,
        blockchain: impl Into<String>,
        provider: Arc<RpcProvider>,
        proxy_reader: Option<Contract>,
        registries: Vec<RegistrySource>,
    ) -> Self {
        let reverse = ReverseIndex::new(registries, proxy_reader.clone());
        Self { layer, network_id, blockchain: blockchain.into(), provider, proxy_reader, reverse }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    pub fn reverse_index(&self) -> &ReverseIndex {
        &self.reverse
    }

    fn proxy_reader(&self) -> Result<&Contract> {
        self.proxy_reader.as_ref().ok_or(ResolutionError::ProxyReaderNotInitialized)
    }

    /// Whether the token exists; `false` becomes `UnregisteredDomain`.
    async fn exists(&self, name: &str) -> Result<bool> {
        let decoded = self.proxy_reader()?.call("exists", &[token_arg(name)]).await?;
        match decoded.at(0).and_then(AbiValue::as_bool) {
            Some(true) => Ok(true),
            _ => Err(unregistered(name)),
        }
    }

    /// `getData` for one domain, whether registered or not.
    pub async fn data(&self, domain: &str, keys: &[String]) -> Result<DomainData> {
        let decoded = self
            .proxy_reader()?
            .call("getData", &[AbiValue::string_list(keys.iter().cloned()), token_arg(domain)])
            .await?;
        let address = |field: &str| decoded.get(field).and_then(AbiValue::as_address).and_then(non_zero);
        let values = decoded.get("values").and_then(AbiValue::to_string_list).unwrap_or_default();
        let records = keys.iter().cloned().zip(values.into_iter().chain(std::iter::repeat(String::new()))).collect();
        debug!(target: "resolution::uns", layer = %self.layer, domain, keys = keys.len(), "getData");
        Ok(DomainData { owner: address("owner"), resolver: address("resolver"), records })
    }

    /// `getData` for a domain that must be registered on this layer.
    async fn registered(&self, domain: &str, keys: &[String]) -> Result<DomainData> {
        let data = self.data(domain, keys).await?;
        if data.owner.is_none() {
            return Err(unregistered(domain));
        }
        Ok(data)
    }

    async fn owner(&self, domain: &str) -> Result<Address> {
        self.registered(domain, &[]).await?.owner.ok_or_else(|| unregistered(domain))
    }

    async fn resolver(&self, domain: &str) -> Result<Address> {
        let data = self.registered(domain, &[]).await?;
        data.resolver.ok_or_else(|| ResolutionError::UnspecifiedResolver(domain.to_string()))
    }

    async fn records(&self, domain: &str, keys: &[String]) -> Result<BTreeMap<String, String>> {
        Ok(self.registered(domain, keys).await?.records)
    }

    async fn record(&self, domain: &str, key: &str) -> Result<String> {
        let mut data = self.registered(domain, &[key.to_string()]).await?;
        if data.resolver.is_none() {
            return Err(ResolutionError::UnspecifiedResolver(domain.to_string()));
        }
        non_empty_record(domain, key, data.records.remove(key))
    }

    /// Owners of several domains through one `ownerOfForMany` call.
    async fn owners(&self, domains: &[String]) -> Result<BTreeMap<String, Result<Address>>> {
        let ids = domains.iter().map(|d| namehash(d, HashChain::Keccak).as_u256());
        let decoded = self.proxy_reader()?.call("ownerOfForMany", &[AbiValue::uint_list(ids)]).await?;
        let owners = decoded.get("owners").and_then(AbiValue::to_address_list).unwrap_or_default();
        Ok(domains
            .iter()
            .enumerate()
            .map(|(i, domain)| {
                let owner = owners.get(i).copied().and_then(non_zero).ok_or_else(|| unregistered(domain));
                (domain.clone(), owner)
            })
            .collect())
    }

    async fn token_uri(&self, domain: &str) -> Result<String> {
        let decoded = match self.proxy_reader()?.call("tokenURI", &[token_arg(domain)]).await {
            Ok(decoded) => decoded,
            // the registry reverts for tokens it never minted
            Err(ResolutionError::ExecutionReverted(_)) => return Err(unregistered(domain)),
            Err(err) => return Err(err),
        };
        if decoded.revert_reason().is_some() {
            return Err(unregistered(domain));
        }
        decoded
            .at(0)
            .and_then(AbiValue::as_str)
            .filter(|uri| !uri.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| unregistered(domain))
    }

    /// Registry, owner and resolver of several domains in one `multicall`.
    async fn locations(&self, domains: &[String]) -> Result<BTreeMap<String, Result<Location>>> {
        let proxy_reader = self.proxy_reader()?;
        let calls: Vec<(&str, Vec<AbiValue>)> = domains
            .iter()
            .flat_map(|d| {
                [
                    ("registryOf", vec![token_arg(d)]),
                    ("getData", vec![AbiValue::string_list(Vec::<String>::new()), token_arg(d)]),
                ]
            })
            .collect();
        let results = proxy_reader.multicall(&calls).await?;

        let mut locations = BTreeMap::new();
        for (domain, pair) in domains.iter().zip(results.chunks(2)) {
            let registry = proxy_reader.decode_output("registryOf", &pair[0])?;
            let data = proxy_reader.decode_output("getData", &pair[1])?;
            let registry = registry.at(0).and_then(AbiValue::as_address).and_then(non_zero);
            let owner = data.get("owner").and_then(AbiValue::as_address).and_then(non_zero);
            let location = match (registry, owner) {
                (Some(registry_address), Some(owner_address)) => Ok(Location {
                    registry_address,
                    resolver_address: data.get("resolver").and_then(AbiValue::as_address).and_then(non_zero),
                    network_id: self.network_id,
                    blockchain: self.blockchain.clone(),
                    owner_address,
                    blockchain_provider_url: self.provider.endpoint().to_string(),
                }),
                _ => Err(unregistered(domain)),
            };
            locations.insert(domain.clone(), location);
        }
        Ok(locations)
    }

    async fn reverse_of(&self, address: Address) -> Result<TokenId> {
        let decoded = self.proxy_reader()?.call("reverseOf", &[AbiValue::Address(address)]).await?;
        decoded
            .at(0)
            .and_then(AbiValue::as_uint)
            .filter(|id| *id != U256::ZERO)
            .map(TokenId::from_u256)
            .ok_or_else(|| unregistered(&format!("{address:#x}")))
    }

    async fn unhash(&self, token: TokenId) -> Result<String> {
        self.reverse.unhash(token).await?.ok_or_else(|| unregistered(&token.to_hex()))
    }
}

/// Spread a whole-layer failure over every requested domain.
fn per_domain<T>(
    domains: &[String],
    outcome: Result<BTreeMap<String, Result<T>>>,
) -> BTreeMap<String, Result<T>> {
    match outcome {
        Ok(map) => map,
        Err(err) => domains.iter().map(|d| (d.clone(), Err(err.clone()))).collect(),
    }
}

/// Unregistered entries become `None`; any other failure fails the batch.
fn settle<T>(merged: BTreeMap<String, Result<T>>) -> Result<BTreeMap<String, Option<T>>> {
    merged
        .into_iter()
        .map(|(domain, result)| match result {
            Ok(value) => Ok((domain, Some(value))),
            Err(err) if err.is_unregistered() => Ok((domain, None)),
            Err(err) => Err(err),
        })
        .collect()
}

/// UNS across L1 and L2.
#[derive(Clone)]
pub struct Uns {
    l1: UnsLayer,
    l2: UnsLayer,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Uns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uns").field("l1", &self.l1).field("l2", &self.l2).finish()
    }
}

impl Uns {
    pub fn new(l1: UnsLayer, l2: UnsLayer, transport: Arc<dyn Transport>) -> Self {
        Self { l1, l2, transport }
    }

    pub fn layer(&self, layer: Layer) -> &UnsLayer {
        match layer {
            Layer::L1 => &self.l1,
            Layer::L2 => &self.l2,
        }
    }
}

#[async_trait]
impl NamingService for Uns {
    fn name(&self) -> ServiceName {
        ServiceName::Uns
    }

    async fn supports(&self, domain: &str) -> Result<bool> {
        let Some(tld) = domain.rsplit('.').next().filter(|tld| !tld.is_empty()) else {
            return Ok(false);
        };
        match run_layers(self.l1.exists(tld), self.l2.exists(tld)).await {
            Ok(exists) => Ok(exists),
            Err(err) if err.is_unregistered() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn namehash(&self, domain: &str) -> TokenId {
        namehash(domain, HashChain::Keccak)
    }

    async fn owner(&self, domain: &str) -> Result<Address> {
        run_layers(self.l1.owner(domain), self.l2.owner(domain)).await
    }

    async fn batch_owners(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Address>>> {
        let (l1, l2) = join_layers(self.l1.owners(domains), self.l2.owners(domains)).await;
        let merged = merge_keyed(
            per_domain(domains, l1.result),
            per_domain(domains, l2.result),
            |d| unregistered(d),
        );
        settle(merged)
    }

    async fn resolver(&self, domain: &str) -> Result<Address> {
        run_layers(self.l1.resolver(domain), self.l2.resolver(domain)).await
    }

    async fn record(&self, domain: &str, key: &str) -> Result<String> {
        run_layers(self.l1.record(domain, key), self.l2.record(domain, key)).await
    }

    async fn records(&self, domain: &str, keys: &[String]) -> Result<BTreeMap<String, String>> {
        run_layers(self.l1.records(domain, keys), self.l2.records(domain, keys)).await
    }

    async fn addr(&self, domain: &str, ticker: &str) -> Result<String> {
        self.record(domain, &crypto_address_key(ticker)).await
    }

    async fn token_uri(&self, domain: &str) -> Result<String> {
        run_layers(self.l1.token_uri(domain), self.l2.token_uri(domain)).await
    }

    async fn token_uri_metadata(&self, domain: &str) -> Result<TokenMetadata> {
        let uri = self.token_uri(domain).await?;
        fetch_metadata(self.transport.as_ref(), &uri).await
    }

    async fn unhash(&self, token: TokenId) -> Result<String> {
        run_layers(self.l1.unhash(token), self.l2.unhash(token)).await
    }

    /// Union of both layers; a failure on either layer fails the query.
    async fn domains_owned_by(&self, owner: Address) -> Result<Vec<String>> {
        let (l1, l2) = join_layers(
            self.l1.reverse.domains_owned_by(owner),
            self.l2.reverse.domains_owned_by(owner),
        )
        .await;
        let mut owned: BTreeSet<String> = l2.result?;
        owned.extend(l1.result?);
        Ok(owned.into_iter().collect())
    }

    async fn locations(&self, domains: &[String]) -> Result<BTreeMap<String, Option<Location>>> {
        let (l1, l2) = join_layers(self.l1.locations(domains), self.l2.locations(domains)).await;
        let merged = merge_keyed(
            per_domain(domains, l1.result),
            per_domain(domains, l2.result),
            |d| unregistered(d),
        );
        settle(merged)
    }

    async fn reverse_token_id(&self, address: Address) -> Result<TokenId> {
        match run_layers(self.l1.reverse_of(address), self.l2.reverse_of(address)).await {
            Err(err) if err.is_unregistered() => {
                Err(ResolutionError::ReverseResolutionNotSpecified(format!("{address:#x}")))
            }
            other => other,
        }
    }
}
