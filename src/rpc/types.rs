use crate::services::ServiceName;
use alloy_primitives::Address;
use serde::Serialize;

/// Response for `resolution_namehash`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamehashResponse {
    pub domain: String,
    pub service: ServiceName,
    pub namehash: String,
}

/// Response for `resolution_reverse`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseResponse {
    pub address: Address,
    pub token_id: String,
    pub domain: String,
}
