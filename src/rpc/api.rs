use alloy_primitives::Address;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use std::collections::BTreeMap;

use super::types::{NamehashResponse, ReverseResponse};
use crate::services::{Location, ServiceName, TokenMetadata};

/// The `resolution_*` RPC namespace definition.
#[rpc(server, namespace = "resolution")]
pub trait ResolutionApi {
    /// Returns the token id of a domain and the service that hashes it.
    #[method(name = "namehash")]
    async fn namehash(&self, domain: String) -> RpcResult<NamehashResponse>;

    /// Returns whether any configured naming service serves the domain.
    #[method(name = "isSupported")]
    async fn is_supported(&self, domain: String) -> RpcResult<bool>;

    #[method(name = "serviceName")]
    async fn service_name(&self, domain: String) -> RpcResult<ServiceName>;

    #[method(name = "owner")]
    async fn owner(&self, domain: String) -> RpcResult<Address>;

    /// Returns the owners of domains of one family; unregistered ones are null.
    #[method(name = "batchOwners")]
    async fn batch_owners(&self, domains: Vec<String>) -> RpcResult<BTreeMap<String, Option<Address>>>;

    #[method(name = "resolver")]
    async fn resolver(&self, domain: String) -> RpcResult<Address>;

    #[method(name = "record")]
    async fn record(&self, domain: String, key: String) -> RpcResult<String>;

    /// Returns the values of several record keys; missing ones are empty.
    #[method(name = "records")]
    async fn records(&self, domain: String, keys: Vec<String>) -> RpcResult<BTreeMap<String, String>>;

    /// Returns the address the domain holds for a currency ticker.
    #[method(name = "addr")]
    async fn addr(&self, domain: String, ticker: String) -> RpcResult<String>;

    #[method(name = "tokenUri")]
    async fn token_uri(&self, domain: String) -> RpcResult<String>;

    #[method(name = "tokenUriMetadata")]
    async fn token_uri_metadata(&self, domain: String) -> RpcResult<TokenMetadata>;

    /// Returns the domain name behind a 0x-prefixed token id.
    #[method(name = "unhash")]
    async fn unhash(&self, token_id: String, service: ServiceName) -> RpcResult<String>;

    #[method(name = "domainsOwnedBy")]
    async fn domains_owned_by(&self, owner: Address) -> RpcResult<Vec<String>>;

    #[method(name = "locations")]
    async fn locations(&self, domains: Vec<String>) -> RpcResult<BTreeMap<String, Option<Location>>>;

    /// Returns the primary domain an address configured for itself.
    #[method(name = "reverse")]
    async fn reverse(&self, address: Address) -> RpcResult<ReverseResponse>;
}
