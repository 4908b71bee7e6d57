//! Scripted transports for unit tests.
//!
//! `MockTransport` answers JSON-RPC envelopes (single or batched) with a
//! closure; `FakeChain` plays an EVM chain hosting a ProxyReader and the
//! registries whose logs the reverse index replays.

use crate::abi::{bytes_to_hex, encode_params, hex_to_bytes, AbiValue, ContractAbis, ParamType};
use crate::constants::{NEW_URI_EVENT, TRANSFER_EVENT};
use crate::errors::{ResolutionError, Result};
use crate::namehash::{namehash, HashChain};
use crate::onchain::{encode_address, LogEntry, Transport};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Answer to one JSON-RPC request.
pub(crate) enum Reply {
    Result(Value),
    Error { code: i64, message: String },
    /// Replaces the whole response envelope, id included
    Raw(Value),
    /// Fails the whole HTTP exchange
    Fail(ResolutionError),
}

impl Reply {
    pub fn result(value: impl Into<Value>) -> Self {
        Reply::Result(value.into())
    }

    pub fn error(code: i64, message: &str) -> Self {
        Reply::Error { code, message: message.to_string() }
    }
}

type Handler = dyn Fn(&str, &str, &Value) -> Reply + Send + Sync;

pub(crate) struct MockTransport {
    handler: Box<Handler>,
    posts: Mutex<Vec<(String, Value)>>,
    documents: HashMap<String, Value>,
    reverse_batches: bool,
    extra_batch_responses: usize,
}

impl MockTransport {
    /// `handler(endpoint, method, params)` answers each request.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &str, &Value) -> Reply + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            posts: Mutex::new(Vec::new()),
            documents: HashMap::new(),
            reverse_batches: false,
            extra_batch_responses: 0,
        }
    }

    /// Answer batches in reverse order.
    pub fn reversed(mut self) -> Self {
        self.reverse_batches = true;
        self
    }

    /// Append unsolicited entries to every batch response.
    pub fn with_extra_batch_responses(mut self, count: usize) -> Self {
        self.extra_batch_responses = count;
        self
    }

    /// Serve `body` for GET requests to `url`.
    pub fn with_document(mut self, url: &str, body: Value) -> Self {
        self.documents.insert(url.to_string(), body);
        self
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    fn respond(&self, endpoint: &str, request: &Value) -> Result<Value> {
        let id = request["id"].clone();
        let method = request["method"].as_str().unwrap_or_default();
        match (self.handler)(endpoint, method, &request["params"]) {
            Reply::Result(result) => Ok(json!({ "jsonrpc": "2.0", "id": id, "result": result })),
            Reply::Error { code, message } => Ok(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message }
            })),
            Reply::Raw(envelope) => Ok(envelope),
            Reply::Fail(err) => Err(err),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        self.posts.lock().unwrap().push((endpoint.to_string(), body.clone()));
        match &body {
            Value::Array(requests) => {
                let mut responses = requests
                    .iter()
                    .map(|r| self.respond(endpoint, r))
                    .collect::<Result<Vec<_>>>()?;
                if self.reverse_batches {
                    responses.reverse();
                }
                for i in 0..self.extra_batch_responses {
                    responses.push(json!({ "jsonrpc": "2.0", "id": 10_000 + i, "result": "0x" }));
                }
                Ok(Value::Array(responses))
            }
            single => self.respond(endpoint, single),
        }
    }

    async fn get(&self, url: &str) -> Result<Value> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ResolutionError::BadRequestOrResponse(format!("{url} returned HTTP 404")))
    }
}

/// Target and call data of an `eth_call` request.
pub(crate) fn eth_call_target(params: &Value) -> Option<(Address, Vec<u8>)> {
    let to = params[0]["to"].as_str()?.parse().ok()?;
    let data = hex_to_bytes(params[0]["data"].as_str()?).ok()?;
    Some((to, data))
}

#[derive(Debug, Clone)]
pub(crate) struct FakeDomain {
    pub name: String,
    pub owner: Address,
    pub resolver: Address,
    pub registry: Address,
    pub records: HashMap<String, String>,
}

enum Fault {
    Malformed,
    Revert(String),
}

/// An EVM chain with a ProxyReader at `proxy_reader` and UNS-style registries.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeChain {
    proxy_reader: Address,
    domains: HashMap<U256, FakeDomain>,
    tlds: HashSet<U256>,
    reverse: HashMap<Address, U256>,
    logs: Vec<LogEntry>,
    malformed_owners: HashSet<U256>,
    failing_log_registries: HashSet<Address>,
    failure: Option<ResolutionError>,
}

fn token(name: &str) -> U256 {
    namehash(name, HashChain::Keccak).as_u256()
}

impl FakeChain {
    pub fn new(proxy_reader: Address) -> Self {
        Self { proxy_reader, ..Default::default() }
    }

    pub fn with_tld(mut self, tld: &str) -> Self {
        self.tlds.insert(token(tld));
        self
    }

    /// Mint `name` to `owner` in `registry`, emitting `Transfer` and `NewURI`.
    pub fn with_domain(
        mut self,
        name: &str,
        owner: Address,
        resolver: Address,
        registry: Address,
        records: &[(&str, &str)],
    ) -> Self {
        let id = token(name);
        self.domains.insert(
            id,
            FakeDomain {
                name: name.to_string(),
                owner,
                resolver,
                registry,
                records: records.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            },
        );
        self.push_transfer(registry, Address::ZERO, owner, id);
        let uri = encode_params(&[ParamType::String], &[AbiValue::from(name)]).unwrap_or_default();
        self.push_log(registry, vec![topic(NEW_URI_EVENT), B256::from(id)], uri);
        self
    }

    /// Transfer an existing domain, emitting `Transfer`.
    pub fn with_transfer(mut self, name: &str, to: Address) -> Self {
        let id = token(name);
        if let Some(domain) = self.domains.get_mut(&id) {
            let (from, registry) = (domain.owner, domain.registry);
            domain.owner = to;
            self.push_transfer(registry, from, to, id);
        }
        self
    }

    pub fn with_reverse(mut self, owner: Address, name: &str) -> Self {
        self.reverse.insert(owner, token(name));
        self
    }

    /// `ownerOf` for `name` returns malformed hex.
    pub fn with_malformed_owner(mut self, name: &str) -> Self {
        self.malformed_owners.insert(token(name));
        self
    }

    /// `eth_getLogs` against `registry` fails.
    pub fn with_failing_logs(mut self, registry: Address) -> Self {
        self.failing_log_registries.insert(registry);
        self
    }

    /// Every request to this chain fails with `err`.
    pub fn failing(mut self, err: ResolutionError) -> Self {
        self.failure = Some(err);
        self
    }

    fn push_transfer(&mut self, registry: Address, from: Address, to: Address, id: U256) {
        self.push_log(
            registry,
            vec![topic(TRANSFER_EVENT), encode_address(from), encode_address(to), B256::from(id)],
            Vec::new(),
        );
    }

    fn push_log(&mut self, address: Address, topics: Vec<B256>, data: Vec<u8>) {
        let index = self.logs.len() as u64;
        self.logs.push(LogEntry {
            address,
            block_number: Some(U64::from(1_000 + index)),
            block_hash: None,
            topics,
            data: Bytes::from(data),
            transaction_hash: None,
            log_index: Some(U64::from(index)),
        });
    }

    pub fn handle(&self, method: &str, params: &Value) -> Reply {
        if let Some(err) = &self.failure {
            return Reply::Fail(err.clone());
        }
        match method {
            "eth_call" => self.eth_call(params),
            "eth_getLogs" => self.get_logs(params),
            _ => Reply::error(-32601, "method not found"),
        }
    }

    fn eth_call(&self, params: &Value) -> Reply {
        let Some((to, data)) = eth_call_target(params) else {
            return Reply::error(-32602, "invalid params");
        };
        if to != self.proxy_reader {
            return Reply::result("0x");
        }
        match self.execute(&data) {
            Ok(out) => Reply::result(bytes_to_hex(&out)),
            Err(Fault::Malformed) => Reply::result("0xabc"),
            Err(Fault::Revert(reason)) => Reply::error(3, &format!("execution reverted: {reason}")),
        }
    }

    fn execute(&self, data: &[u8]) -> std::result::Result<Vec<u8>, Fault> {
        let abi = ContractAbis::bundled().map_err(|_| Fault::Malformed)?.proxy_reader;
        let names = [
            "getData",
            "ownerOf",
            "ownerOfForMany",
            "exists",
            "registryOf",
            "tokenURI",
            "reverseOf",
            "multicall",
        ];
        let name = names
            .into_iter()
            .find(|n| abi.function(n).map(|f| data.starts_with(&f.selector())).unwrap_or(false))
            .ok_or_else(|| Fault::Revert("unknown selector".into()))?;
        let args = abi.decode_input(name, data).map_err(|_| Fault::Malformed)?;
        let uint = |field: &str| args.get(field).and_then(AbiValue::as_uint).unwrap_or_default();

        let outputs = match name {
            "getData" => {
                let keys = args.get("keys").and_then(AbiValue::to_string_list).unwrap_or_default();
                let (resolver, owner, values) = self.data_of(uint("tokenId"), &keys);
                vec![resolver.into(), owner.into(), AbiValue::string_list(values)]
            }
            "ownerOf" => {
                let id = uint("tokenId");
                if self.malformed_owners.contains(&id) {
                    return Err(Fault::Malformed);
                }
                vec![self.owner_of(id).into()]
            }
            "ownerOfForMany" => {
                let ids = args.get("tokenIds").and_then(AbiValue::as_array).unwrap_or_default();
                let owners = ids
                    .iter()
                    .filter_map(AbiValue::as_uint)
                    .map(|id| AbiValue::from(self.owner_of(id)))
                    .collect();
                vec![AbiValue::Array(owners)]
            }
            "exists" => {
                let id = uint("tokenId");
                vec![(self.tlds.contains(&id) || self.domains.contains_key(&id)).into()]
            }
            "registryOf" => {
                let registry = self.domains.get(&uint("tokenId")).map(|d| d.registry);
                vec![registry.unwrap_or_default().into()]
            }
            "tokenURI" => match self.domains.get(&uint("tokenId")) {
                Some(d) => vec![format!("https://metadata.test/{}", d.name).into()],
                None => return Err(Fault::Revert("URI query for nonexistent token".into())),
            },
            "reverseOf" => {
                let addr = args.get("addr").and_then(AbiValue::as_address).unwrap_or_default();
                vec![self.reverse.get(&addr).copied().unwrap_or_default().into()]
            }
            "multicall" => {
                let calls = args.get("data").and_then(AbiValue::to_bytes_list).unwrap_or_default();
                let results = calls
                    .iter()
                    .map(|call| self.execute(call))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                vec![AbiValue::bytes_list(results)]
            }
            _ => unreachable!("selector list and match arms agree"),
        };
        abi.encode_output(name, &outputs).map_err(|_| Fault::Malformed)
    }

    fn owner_of(&self, id: U256) -> Address {
        self.domains.get(&id).map(|d| d.owner).unwrap_or_default()
    }

    fn data_of(&self, id: U256, keys: &[String]) -> (Address, Address, Vec<String>) {
        match self.domains.get(&id) {
            Some(d) => (
                d.resolver,
                d.owner,
                keys.iter().map(|k| d.records.get(k).cloned().unwrap_or_default()).collect(),
            ),
            None => (Address::ZERO, Address::ZERO, vec![String::new(); keys.len()]),
        }
    }

    fn get_logs(&self, params: &Value) -> Reply {
        let filter = &params[0];
        let Some(address) = filter["address"].as_str().and_then(|a| a.parse::<Address>().ok()) else {
            return Reply::error(-32602, "invalid params");
        };
        if self.failing_log_registries.contains(&address) {
            return Reply::error(-32005, "query returned more than 10000 results");
        }
        let topics: Vec<Option<B256>> = filter["topics"]
            .as_array()
            .map(|ts| ts.iter().map(|t| t.as_str().and_then(|t| t.parse().ok())).collect())
            .unwrap_or_default();
        let matched: Vec<&LogEntry> = self
            .logs
            .iter()
            .filter(|log| log.address == address)
            .filter(|log| {
                topics
                    .iter()
                    .enumerate()
                    .all(|(i, t)| t.is_none() || log.topics.get(i) == t.as_ref())
            })
            .collect();
        Reply::result(serde_json::to_value(&matched).unwrap_or_default())
    }
}

fn topic(signature: &str) -> B256 {
    crate::abi::event_topic(signature)
}

/// A transport serving one fake chain per endpoint.
pub(crate) fn fake_transport(chains: Vec<(&str, FakeChain)>) -> MockTransport {
    let chains: Arc<HashMap<String, FakeChain>> =
        Arc::new(chains.into_iter().map(|(e, c)| (e.to_string(), c)).collect());
    MockTransport::new(move |endpoint, method, params| match chains.get(endpoint) {
        Some(chain) => chain.handle(method, params),
        None => Reply::Fail(ResolutionError::UnknownError(format!("no chain at {endpoint}"))),
    })
}
