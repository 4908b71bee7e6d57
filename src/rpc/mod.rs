//! Resolution RPC Namespace
//!
//! Exposes the resolution façade over JSON-RPC as the `resolution_*`
//! namespace. Resolution errors map to stable error codes: 1xxx for domain
//! outcomes the caller can act on, 2xxx for provider and decoding failures.

pub mod api;
pub mod types;

pub use api::ResolutionApiServer;
pub use types::{NamehashResponse, ReverseResponse};

use crate::errors::ResolutionError;
use crate::namehash::TokenId;
use crate::resolution::{normalize, Resolution};
use crate::services::{Location, ServiceName, TokenMetadata};
use alloy_primitives::Address;
use jsonrpsee::core::RpcResult;
use jsonrpsee::types::error::INVALID_PARAMS_CODE;
use jsonrpsee::types::ErrorObjectOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stable code and kind name of a resolution error.
pub fn error_code(err: &ResolutionError) -> (i32, &'static str) {
    match err {
        ResolutionError::UnregisteredDomain(_) => (1001, "UnregisteredDomain"),
        ResolutionError::UnsupportedDomain(_) => (1002, "UnsupportedDomain"),
        ResolutionError::UnsupportedNetwork(_) => (1003, "UnsupportedNetwork"),
        ResolutionError::UnspecifiedResolver(_) => (1004, "UnspecifiedResolver"),
        ResolutionError::RecordNotFound { .. } => (1005, "RecordNotFound"),
        ResolutionError::RecordNotSupported(_) => (1006, "RecordNotSupported"),
        ResolutionError::ReverseResolutionNotSpecified(_) => (1007, "ReverseResolutionNotSpecified"),
        ResolutionError::ProxyReaderNotInitialized => (1008, "ProxyReaderNotInitialized"),
        ResolutionError::InconsistentDomainArray(_) => (1009, "InconsistentDomainArray"),
        ResolutionError::MethodNotSupported { .. } => (1010, "MethodNotSupported"),
        ResolutionError::TooManyResponses { .. } => (2001, "TooManyResponses"),
        ResolutionError::RateLimited(_) => (2002, "RateLimited"),
        ResolutionError::Unauthenticated(_) => (2003, "Unauthenticated"),
        ResolutionError::ExecutionReverted(_) => (2004, "ExecutionReverted"),
        ResolutionError::BadRequestOrResponse(_) => (2005, "BadRequestOrResponse"),
        ResolutionError::DecodingError(_) => (2006, "DecodingError"),
        ResolutionError::WrongInterface(_) => (2007, "WrongInterface"),
        ResolutionError::UnknownError(_) => (2099, "UnknownError"),
    }
}

fn rpc_error(err: ResolutionError) -> ErrorObjectOwned {
    let (code, kind) = error_code(&err);
    ErrorObjectOwned::owned(code, err.to_string(), Some(kind))
}

/// Implementation of the `resolution_*` RPC namespace.
#[derive(Debug, Clone)]
pub struct ResolutionRpc {
    resolution: Arc<Resolution>,
}

impl ResolutionRpc {
    pub fn new(resolution: Arc<Resolution>) -> Self {
        Self { resolution }
    }
}

#[async_trait::async_trait]
impl ResolutionApiServer for ResolutionRpc {
    async fn namehash(&self, domain: String) -> RpcResult<NamehashResponse> {
        let domain = normalize(&domain);
        Ok(NamehashResponse {
            service: ServiceName::classify(&domain),
            namehash: self.resolution.namehash(&domain).to_hex(),
            domain,
        })
    }

    async fn is_supported(&self, domain: String) -> RpcResult<bool> {
        self.resolution.is_supported(&domain).await.map_err(rpc_error)
    }

    async fn service_name(&self, domain: String) -> RpcResult<ServiceName> {
        self.resolution.service_name(&domain).await.map_err(rpc_error)
    }

    async fn owner(&self, domain: String) -> RpcResult<Address> {
        self.resolution.owner(&domain).await.map_err(rpc_error)
    }

    async fn batch_owners(&self, domains: Vec<String>) -> RpcResult<BTreeMap<String, Option<Address>>> {
        self.resolution.batch_owners(&domains).await.map_err(rpc_error)
    }

    async fn resolver(&self, domain: String) -> RpcResult<Address> {
        self.resolution.resolver(&domain).await.map_err(rpc_error)
    }

    async fn record(&self, domain: String, key: String) -> RpcResult<String> {
        self.resolution.record(&domain, &key).await.map_err(rpc_error)
    }

    async fn records(&self, domain: String, keys: Vec<String>) -> RpcResult<BTreeMap<String, String>> {
        self.resolution.records(&domain, &keys).await.map_err(rpc_error)
    }

    async fn addr(&self, domain: String, ticker: String) -> RpcResult<String> {
        self.resolution.addr(&domain, &ticker).await.map_err(rpc_error)
    }

    async fn token_uri(&self, domain: String) -> RpcResult<String> {
        self.resolution.token_uri(&domain).await.map_err(rpc_error)
    }

    async fn token_uri_metadata(&self, domain: String) -> RpcResult<TokenMetadata> {
        self.resolution.token_uri_metadata(&domain).await.map_err(rpc_error)
    }

    async fn unhash(&self, token_id: String, service: ServiceName) -> RpcResult<String> {
        let token = TokenId::from_hex(&token_id).ok_or_else(|| {
            ErrorObjectOwned::owned(INVALID_PARAMS_CODE, format!("invalid token id {token_id}"), None::<()>)
        })?;
        self.resolution.unhash(token, service).await.map_err(rpc_error)
    }

    async fn domains_owned_by(&self, owner: Address) -> RpcResult<Vec<String>> {
        self.resolution.domains_owned_by(owner).await.map_err(rpc_error)
    }

    async fn locations(&self, domains: Vec<String>) -> RpcResult<BTreeMap<String, Option<Location>>> {
        self.resolution.locations(&domains).await.map_err(rpc_error)
    }

    async fn reverse(&self, address: Address) -> RpcResult<ReverseResponse> {
        let token = self.resolution.reverse_token_id(address).await.map_err(rpc_error)?;
        let domain = self.resolution.unhash(token, ServiceName::Uns).await.map_err(rpc_error)?;
        Ok(ReverseResponse { address, token_id: token.to_hex(), domain })
    }
}
