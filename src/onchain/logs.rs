use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Block reference accepted by `eth_getLogs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockTag {
    Earliest,
    Latest,
    Number(u64),
}

impl BlockTag {
    pub fn to_param(&self) -> String {
        match self {
            BlockTag::Earliest => "earliest".to_string(),
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Number(n) => format!("{n:#x}"),
        }
    }
}

/// Log filter for a single contract.
///
/// `topics[0]` is the event topic; `None` entries match any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub from_block: BlockTag,
    pub to_block: BlockTag,
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    pub fn to_params(&self) -> Value {
        let topics: Vec<Value> = self
            .topics
            .iter()
            .map(|t| t.map_or(Value::Null, |t| Value::String(format!("{t:#x}"))))
            .collect();
        json!([{
            "address": format!("{:#x}", self.address),
            "fromBlock": self.from_block.to_param(),
            "toBlock": self.to_block.to_param(),
            "topics": topics,
        }])
    }
}

/// One entry of an `eth_getLogs` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub log_index: Option<U64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_block_tag_params() {
        assert_eq!(BlockTag::Earliest.to_param(), "earliest");
        assert_eq!(BlockTag::Latest.to_param(), "latest");
        assert_eq!(BlockTag::Number(9_082_251).to_param(), "0x8a958b");
    }

    #[test]
    fn test_filter_params_keep_wildcards() {
        let topic = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
        let filter = LogFilter {
            address: Address::repeat_byte(0xab),
            from_block: BlockTag::Number(16),
            to_block: BlockTag::Latest,
            topics: vec![Some(topic), None, Some(B256::ZERO)],
        };
        let params = filter.to_params();
        assert_eq!(params[0]["fromBlock"], "0x10");
        assert_eq!(params[0]["toBlock"], "latest");
        assert_eq!(params[0]["topics"][1], Value::Null);
        assert_eq!(params[0]["topics"][0], format!("{topic:#x}"));
        assert_eq!(params[0]["address"], format!("{:#x}", Address::repeat_byte(0xab)));
    }

    #[test]
    fn test_log_entry_deserializes_rpc_shape() {
        let raw = json!({
            "address": "0xd1e5b0ff1287aa9f9a268759062e4ab08b9dacbe",
            "blockNumber": "0x8a958b",
            "blockHash": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x",
            "transactionHash": "0x0000000000000000000000000000000000000000000000000000000000000002",
            "logIndex": "0x0",
            "removed": false
        });
        let entry: LogEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.block_number, Some(U64::from(9_082_251u64)));
        assert_eq!(entry.topics.len(), 1);
        assert!(entry.data.is_empty());
    }
}
