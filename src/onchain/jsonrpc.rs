//! JSON-RPC 2.0 envelopes and the provider that speaks them.

use super::logs::{LogEntry, LogFilter};
use super::transport::Transport;
use crate::abi::bytes_to_hex;
use crate::constants::{BATCH_ID_OFFSET, DEFAULT_REQUEST_ID};
use crate::errors::{ResolutionError, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self { jsonrpc: "2.0", id, method: method.to_string(), params }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Ids come back as numbers or as decimal strings depending on the node.
fn numeric_id(id: &Value) -> Option<u64> {
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl JsonRpcResponse {
    fn into_result(self, endpoint: &str) -> Result<Value> {
        match (self.error, self.result) {
            (Some(err), _) => Err(classify_rpc_error(endpoint, err)),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// Map a JSON-RPC error object to the error taxonomy.
pub fn classify_rpc_error(endpoint: &str, err: JsonRpcError) -> ResolutionError {
    let message = err.message.to_lowercase();
    if err.code == 3 || message.contains("revert") {
        let detail = match err.data {
            Some(Value::String(data)) => format!("{} ({data})", err.message),
            _ => err.message,
        };
        ResolutionError::ExecutionReverted(detail)
    } else if err.code == -32005 || err.code == 429 || message.contains("rate limit") {
        ResolutionError::RateLimited(endpoint.to_string())
    } else if message.contains("unauthorized") || message.contains("unauthenticated") {
        ResolutionError::Unauthenticated(endpoint.to_string())
    } else {
        ResolutionError::BadRequestOrResponse(format!("{}: {}", err.code, err.message))
    }
}

fn parse_response(endpoint: &str, value: Value) -> Result<JsonRpcResponse> {
    serde_json::from_value(value)
        .map_err(|e| ResolutionError::BadRequestOrResponse(format!("{endpoint}: {e}")))
}

/// A JSON-RPC endpoint of one chain.
pub struct RpcProvider {
    transport: Arc<dyn Transport>,
    endpoint: String,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcProvider").field("endpoint", &self.endpoint).finish()
    }
}

impl RpcProvider {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self { transport, endpoint: endpoint.into(), next_id: AtomicU64::new(0) }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Next id for non-batched traffic, always below [`BATCH_ID_OFFSET`].
    fn next_request_id(&self) -> u64 {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        DEFAULT_REQUEST_ID + n % (BATCH_ID_OFFSET - DEFAULT_REQUEST_ID)
    }

    /// Send a single request and return its `result`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);
        debug!(target: "resolution::rpc", endpoint = %self.endpoint, method, id = request.id, "request");
        let body = serde_json::to_value(&request)
            .map_err(|e| ResolutionError::BadRequestOrResponse(e.to_string()))?;
        let response = self.transport.post(&self.endpoint, body).await?;
        parse_response(&self.endpoint, response)?.into_result(&self.endpoint)
    }

    /// Send several requests in one round trip.
    ///
    /// Entries are numbered `BATCH_ID_OFFSET + index` and matched back by id,
    /// so the output is in request order whatever order the node answers in.
    /// A failed entry only fails its own position.
    pub async fn batch(&self, calls: Vec<(&str, Value)>) -> Result<Vec<(u64, Result<Value>)>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let requests: Vec<JsonRpcRequest> = calls
            .into_iter()
            .enumerate()
            .map(|(i, (method, params))| JsonRpcRequest::new(BATCH_ID_OFFSET + i as u64, method, params))
            .collect();
        debug!(target: "resolution::rpc", endpoint = %self.endpoint, size = requests.len(), "batch");

        let body = serde_json::to_value(&requests)
            .map_err(|e| ResolutionError::BadRequestOrResponse(e.to_string()))?;
        let responses = match self.transport.post(&self.endpoint, body).await? {
            Value::Array(responses) => responses,
            // some nodes answer a rejected batch with a single error object
            other => {
                let response = parse_response(&self.endpoint, other)?;
                return Err(match response.error {
                    Some(err) => classify_rpc_error(&self.endpoint, err),
                    None => ResolutionError::BadRequestOrResponse(format!(
                        "{}: batch response is not an array",
                        self.endpoint
                    )),
                });
            }
        };
        if responses.len() > requests.len() {
            return Err(ResolutionError::TooManyResponses {
                expected: requests.len(),
                got: responses.len(),
            });
        }

        // a malformed entry fails its own position; one without an id fails none
        let mut by_id = HashMap::with_capacity(responses.len());
        for value in responses {
            let Some(id) = numeric_id(&value["id"]) else {
                debug!(target: "resolution::rpc", endpoint = %self.endpoint, "batch entry without id");
                continue;
            };
            let result = parse_response(&self.endpoint, value)
                .and_then(|response| response.into_result(&self.endpoint));
            by_id.insert(id, result);
        }

        Ok(requests
            .iter()
            .map(|request| {
                let result = match by_id.remove(&request.id) {
                    Some(result) => result,
                    None => Err(ResolutionError::BadRequestOrResponse(format!(
                        "no response for request {}",
                        request.id
                    ))),
                };
                (request.id, result)
            })
            .collect())
    }

    /// `eth_call` against the latest block; returns the hex result.
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<String> {
        let result = self.request("eth_call", call_params(to, data)).await?;
        hex_result(result)
    }

    /// Several `eth_call`s in one batch.
    pub async fn eth_call_batch(&self, calls: &[(Address, Vec<u8>)]) -> Result<Vec<(u64, Result<String>)>> {
        let requests = calls
            .iter()
            .map(|(to, data)| ("eth_call", call_params(*to, data)))
            .collect();
        Ok(self
            .batch(requests)
            .await?
            .into_iter()
            .map(|(id, result)| (id, result.and_then(hex_result)))
            .collect())
    }

    /// `eth_getLogs`, in chain order.
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let result = self.request("eth_getLogs", filter.to_params()).await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result)
            .map_err(|e| ResolutionError::DecodingError(format!("eth_getLogs: {e}")))
    }
}

fn call_params(to: Address, data: &[u8]) -> Value {
    json!([{ "to": format!("{to:#x}"), "data": bytes_to_hex(data) }, "latest"])
}

fn hex_result(value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok("0x".to_string()),
        other => Err(ResolutionError::BadRequestOrResponse(format!(
            "expected hex string, got {other}"
        ))),
    }
}
