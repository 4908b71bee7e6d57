use crate::errors::{ResolutionError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Request/response contract with the network.
///
/// The resolution core only posts JSON-RPC envelopes and fetches JSON
/// documents; timeouts and retries belong to the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON-RPC request or batch to `endpoint`.
    async fn post(&self, endpoint: &str, body: Value) -> Result<Value>;

    /// GET a JSON document, e.g. token metadata.
    async fn get(&self, url: &str) -> Result<Value>;
}

/// [`Transport`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    /// Bearer tokens by endpoint; other endpoints get none
    api_keys: HashMap<String, String>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolutionError::UnknownError(e.to_string()))?;
        Ok(Self { client, api_keys: HashMap::new() })
    }

    /// Send `key` as a bearer token to `endpoint` only.
    pub fn with_api_key(mut self, endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(endpoint.into(), key.into());
        self
    }

    pub fn with_api_keys(self, keys: impl IntoIterator<Item = (String, String)>) -> Self {
        keys.into_iter().fold(self, |transport, (endpoint, key)| transport.with_api_key(endpoint, key))
    }

    fn api_key_for(&self, endpoint: &str) -> Option<&str> {
        self.api_keys.get(endpoint).map(String::as_str)
    }

    async fn read_json(&self, url: &str, response: reqwest::Response) -> Result<Value> {
        classify_status(url, response.status().as_u16())?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ResolutionError::BadRequestOrResponse(format!("{url}: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = self.api_key_for(endpoint) {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ResolutionError::UnknownError(format!("{endpoint}: {e}")))?;
        debug!(target: "resolution::transport", endpoint, status = %response.status(), "POST");
        self.read_json(endpoint, response).await
    }

    async fn get(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolutionError::UnknownError(format!("{url}: {e}")))?;
        debug!(target: "resolution::transport", url, status = %response.status(), "GET");
        self.read_json(url, response).await
    }
}

/// Map an HTTP status to the transport error taxonomy.
pub fn classify_status(endpoint: &str, status: u16) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        429 => Err(ResolutionError::RateLimited(endpoint.to_string())),
        401 | 403 => Err(ResolutionError::Unauthenticated(endpoint.to_string())),
        _ => Err(ResolutionError::BadRequestOrResponse(format!(
            "{endpoint} returned HTTP {status}"
        ))),
    }
}
