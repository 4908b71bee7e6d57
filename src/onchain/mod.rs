//! Contract call layer
//!
//! Turns (address, function, arguments) into `eth_call` requests, batches
//! independent calls into one round trip, aggregates calls on-chain through
//! `multicall`, and fetches event logs.
//!
//! Architecture:
//!   Contract (ABI encode/decode)
//!     → RpcProvider (JSON-RPC envelopes, batch ids, error classification)
//!       → Transport (HTTP, or a scripted mock in tests)

pub mod helpers;
pub mod jsonrpc;
pub mod logs;
pub mod transport;

pub use helpers::{encode_address, non_zero};
pub use jsonrpc::{classify_rpc_error, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcProvider};
pub use logs::{BlockTag, LogEntry, LogFilter};
pub use transport::{classify_status, HttpTransport, Transport};

use crate::abi::{Abi, AbiValue, Decoded};
use crate::errors::{ResolutionError, Result};
use alloy_primitives::{Address, B256};
use std::sync::Arc;
use tracing::{debug, warn};

/// A deployed contract reachable through a provider.
#[derive(Debug, Clone)]
pub struct Contract {
    address: Address,
    abi: Arc<Abi>,
    provider: Arc<RpcProvider>,
}

impl Contract {
    pub fn new(address: Address, abi: Arc<Abi>, provider: Arc<RpcProvider>) -> Self {
        Self { address, abi, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn provider(&self) -> &Arc<RpcProvider> {
        &self.provider
    }

    /// Call a view function and decode its outputs.
    pub async fn call(&self, function: &str, args: &[AbiValue]) -> Result<Decoded> {
        let data = self.abi.encode(function, args)?;
        debug!(target: "resolution::contract", contract = %self.address, function, "call");
        let result = self.provider.eth_call(self.address, &data).await?;
        Ok(self.abi.decode_hex(function, &result)?)
    }

    /// Call `function` once per argument set, in a single JSON-RPC batch.
    ///
    /// Each entry carries its request id. An entry whose call fails or whose
    /// result does not decode is `None`; the rest of the batch is unaffected.
    pub async fn call_batch(
        &self,
        function: &str,
        args_list: &[Vec<AbiValue>],
    ) -> Result<Vec<(u64, Option<Decoded>)>> {
        let calls = args_list
            .iter()
            .map(|args| Ok((self.address, self.abi.encode(function, args)?)))
            .collect::<Result<Vec<_>>>()?;

        let results = self.provider.eth_call_batch(&calls).await?;
        Ok(results
            .into_iter()
            .map(|(id, result)| {
                let decoded = result
                    .and_then(|hex| self.abi.decode_hex(function, &hex).map_err(ResolutionError::from))
                    .map_err(|e| {
                        warn!(target: "resolution::contract", contract = %self.address, function, id, error = %e, "dropping batch entry");
                    })
                    .ok();
                (id, decoded)
            })
            .collect())
    }

    /// Aggregate several calls into one on-chain `multicall(bytes[])`.
    ///
    /// Returns the raw return data of each sub-call, by position; decode them
    /// with [`Contract::decode_output`] and the sub-call's function name.
    pub async fn multicall(&self, calls: &[(&str, Vec<AbiValue>)]) -> Result<Vec<Vec<u8>>> {
        let encoded = calls
            .iter()
            .map(|(function, args)| self.abi.encode(function, args))
            .collect::<Result<Vec<_>, _>>()?;

        let decoded = self.call("multicall", &[AbiValue::bytes_list(encoded)]).await?;
        let results = decoded
            .get("results")
            .or_else(|| decoded.at(0))
            .and_then(AbiValue::to_bytes_list)
            .ok_or_else(|| ResolutionError::DecodingError("multicall returned no results".into()))?;
        if results.len() != calls.len() {
            return Err(ResolutionError::DecodingError(format!(
                "multicall returned {} results for {} calls",
                results.len(),
                calls.len()
            )));
        }
        Ok(results)
    }

    /// Decode return data produced by a call to `function`.
    pub fn decode_output(&self, function: &str, data: &[u8]) -> Result<Decoded> {
        Ok(self.abi.decode(function, data)?)
    }

    /// Fetch logs of `event` emitted by this contract from `from_block` on.
    ///
    /// `indexed` filters the indexed topics after the event topic, `None`
    /// matching anything. Results are in chain order and not deduplicated.
    pub async fn logs(
        &self,
        from_block: BlockTag,
        event: &str,
        indexed: &[Option<B256>],
    ) -> Result<Vec<LogEntry>> {
        let mut topics = vec![Some(self.abi.event_topic(event)?)];
        topics.extend_from_slice(indexed);
        let filter = LogFilter {
            address: self.address,
            from_block,
            to_block: BlockTag::Latest,
            topics,
        };
        self.provider.get_logs(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::ContractAbis;
    use crate::testing::{eth_call_target, MockTransport, Reply};
    use alloy_primitives::U256;
    use serde_json::json;

    const PROXY: Address = Address::repeat_byte(0x70);

    fn proxy_reader(mock: MockTransport) -> Contract {
        let abis = ContractAbis::bundled().unwrap();
        let provider = Arc::new(RpcProvider::new(Arc::new(mock), "http://l1"));
        Contract::new(PROXY, abis.proxy_reader, provider)
    }

    fn owner_reply(owner: Address) -> Reply {
        let abi = ContractAbis::bundled().unwrap().proxy_reader;
        let data = abi.encode_output("ownerOf", &[AbiValue::Address(owner)]).unwrap();
        Reply::result(crate::abi::bytes_to_hex(&data))
    }

    fn owner_for(id: U256) -> Address {
        Address::repeat_byte(id.byte(0))
    }

    /// Decode the token id argument of an `ownerOf(uint256)` call.
    fn token_arg(data: &[u8]) -> U256 {
        U256::from_be_slice(&data[4..36])
    }

    #[tokio::test]
    async fn test_call_decodes_outputs() {
        let contract = proxy_reader(MockTransport::new(|_, _, params| {
            let (to, data) = eth_call_target(params).unwrap();
            assert_eq!(to, PROXY);
            owner_reply(owner_for(token_arg(&data)))
        }));
        let decoded = contract.call("ownerOf", &[AbiValue::Uint(U256::from(7))]).await.unwrap();
        assert_eq!(decoded.at(0).and_then(AbiValue::as_address), Some(owner_for(U256::from(7))));
    }

    #[tokio::test]
    async fn test_call_with_unknown_function_makes_no_request() {
        let mock = Arc::new(MockTransport::new(|_, _, _| Reply::result("0x")));
        let abis = ContractAbis::bundled().unwrap();
        let provider = Arc::new(RpcProvider::new(mock.clone(), "http://l1"));
        let contract = Contract::new(PROXY, abis.proxy_reader, provider);
        let err = contract.call("burn", &[]).await.unwrap_err();
        assert_eq!(err, ResolutionError::WrongInterface("burn".into()));
        assert_eq!(mock.post_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_with_one_malformed_entry_keeps_the_rest() {
        let contract = proxy_reader(MockTransport::new(|_, _, params| {
            let (_, data) = eth_call_target(params).unwrap();
            let id = token_arg(&data);
            if id == U256::from(3) {
                Reply::result("0xabc")
            } else {
                owner_reply(owner_for(id))
            }
        }));
        let args: Vec<Vec<AbiValue>> =
            (1..=5u64).map(|i| vec![AbiValue::Uint(U256::from(i))]).collect();
        let results = contract.call_batch("ownerOf", &args).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().filter(|(_, d)| d.is_some()).count(), 4);
        assert!(results[2].1.is_none());
        for (i, (_, decoded)) in results.iter().enumerate() {
            if i == 2 {
                continue;
            }
            let owner = decoded.as_ref().and_then(|d| d.at(0)).and_then(AbiValue::as_address);
            assert_eq!(owner, Some(owner_for(U256::from(i as u64 + 1))));
        }
    }

    #[tokio::test]
    async fn test_multicall_results_match_individual_calls() {
        let handler = |_: &str, _: &str, params: &serde_json::Value| {
            let abi = ContractAbis::bundled().unwrap().proxy_reader;
            let (_, data) = eth_call_target(params).unwrap();
            let answer = |call: &[u8]| -> Vec<u8> {
                let id = token_arg(call);
                if call[..4] == abi.function("ownerOf").unwrap().selector() {
                    abi.encode_output("ownerOf", &[AbiValue::Address(owner_for(id))]).unwrap()
                } else {
                    abi.encode_output("exists", &[AbiValue::Bool(id > U256::from(1))]).unwrap()
                }
            };
            let multicall = abi.function("multicall").unwrap().selector();
            let out = if data[..4] == multicall {
                let calls = abi
                    .decode_input("multicall", &data)
                    .unwrap()
                    .get("data")
                    .and_then(AbiValue::to_bytes_list)
                    .unwrap();
                let results: Vec<Vec<u8>> = calls.iter().map(|c| answer(c)).collect();
                abi.encode_output("multicall", &[AbiValue::bytes_list(results)]).unwrap()
            } else {
                answer(&data)
            };
            Reply::result(crate::abi::bytes_to_hex(&out))
        };
        let contract = proxy_reader(MockTransport::new(handler));

        let calls = vec![
            ("ownerOf", vec![AbiValue::Uint(U256::from(1))]),
            ("exists", vec![AbiValue::Uint(U256::from(1))]),
            ("ownerOf", vec![AbiValue::Uint(U256::from(2))]),
            ("exists", vec![AbiValue::Uint(U256::from(2))]),
        ];
        let results = contract.multicall(&calls).await.unwrap();
        assert_eq!(results.len(), calls.len());
        for ((function, args), raw) in calls.iter().zip(&results) {
            let aggregated = contract.decode_output(function, raw).unwrap();
            let individual = contract.call(function, args).await.unwrap();
            assert_eq!(aggregated, individual, "{function} result must match by position");
        }
    }

    #[tokio::test]
    async fn test_logs_request_filter() {
        let mock = Arc::new(MockTransport::new(|_, method, _| {
            assert_eq!(method, "eth_getLogs");
            Reply::result(json!([]))
        }));
        let abis = ContractAbis::bundled().unwrap();
        let provider = Arc::new(RpcProvider::new(mock.clone(), "http://l1"));
        let registry = Contract::new(Address::repeat_byte(0x55), abis.registry.clone(), provider);
        let to = encode_address(Address::repeat_byte(0x01));
        let logs = registry
            .logs(BlockTag::Number(100), "Transfer", &[None, Some(to)])
            .await
            .unwrap();
        assert!(logs.is_empty());

        let (_, body) = mock.posts().remove(0);
        let topics = &body["params"][0]["topics"];
        assert_eq!(topics[0], format!("{:#x}", abis.registry.event_topic("Transfer").unwrap()));
        assert_eq!(topics[1], serde_json::Value::Null);
        assert_eq!(topics[2], format!("{to:#x}"));
        assert_eq!(body["params"][0]["fromBlock"], "0x64");
    }
}
