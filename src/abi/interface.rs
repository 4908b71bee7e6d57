use super::codec::{decode_params, encode_params};
use super::selectors::{event_topic, function_selector};
use super::types::JsonParam;
use super::{AbiError, AbiValue, Param, ParamType};
use crate::constants::REVERT_SELECTOR;
use alloy_primitives::{Address, B256};
use serde::Deserialize;
use std::collections::HashMap;

/// A contract function descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
}

impl Function {
    /// Canonical signature, e.g. `getData(string[],uint256)`.
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    pub fn selector(&self) -> [u8; 4] {
        function_selector(&self.signature())
    }

    fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }
}

/// A contract event descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<Param>,
    pub anonymous: bool,
}

impl Event {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// First topic of every log emitted by this event.
    pub fn topic(&self) -> B256 {
        event_topic(&self.signature())
    }

    /// Types of the non-indexed inputs, which make up the log data.
    fn data_types(&self) -> Vec<ParamType> {
        self.inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect()
    }
}

fn signature(name: &str, inputs: &[Param]) -> String {
    let types: Vec<String> = inputs.iter().map(|p| p.kind.to_string()).collect();
    format!("{name}({})", types.join(","))
}

/// Decoded return values, in declaration order and addressable by name.
///
/// Unnamed outputs are keyed by their position (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    fields: Vec<(String, AbiValue)>,
    revert_reason: Option<String>,
}

impl Decoded {
    fn new(params: &[Param], values: Vec<AbiValue>) -> Self {
        let fields = params
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (p, v))| {
                let name = if p.name.is_empty() { i.to_string() } else { p.name.clone() };
                (name, v)
            })
            .collect();
        Self { fields, revert_reason: None }
    }

    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn at(&self, index: usize) -> Option<&AbiValue> {
        self.fields.get(index).map(|(_, v)| v)
    }

    /// Whether the call returned no data at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Reason carried by an `Error(string)` revert payload, if any.
    pub fn revert_reason(&self) -> Option<&str> {
        self.revert_reason.as_deref()
    }

    pub fn into_values(self) -> Vec<AbiValue> {
        self.fields.into_iter().map(|(_, v)| v).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AbiValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<JsonParam>,
    #[serde(default)]
    outputs: Vec<JsonParam>,
    #[serde(default)]
    anonymous: bool,
}

fn default_entry_type() -> String {
    "function".to_string()
}

/// The descriptor set of one contract: its functions and events.
#[derive(Debug, Clone, Default)]
pub struct Abi {
    functions: HashMap<String, Vec<Function>>,
    events: HashMap<String, Event>,
}

impl Abi {
    /// Parse a standard JSON ABI (an array of function/event entries).
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let entries: Vec<JsonEntry> = serde_json::from_str(json)
            .map_err(|e| AbiError::CouldNotDecode(format!("invalid JSON ABI: {e}")))?;

        let mut abi = Abi::default();
        for entry in &entries {
            let inputs = parse_params(&entry.inputs)?;
            match entry.kind.as_str() {
                "function" => {
                    let outputs = parse_params(&entry.outputs)?;
                    abi.functions
                        .entry(entry.name.clone())
                        .or_default()
                        .push(Function { name: entry.name.clone(), inputs, outputs });
                }
                "event" => {
                    abi.events.insert(
                        entry.name.clone(),
                        Event { name: entry.name.clone(), inputs, anonymous: entry.anonymous },
                    );
                }
                // constructors, errors, fallback and receive are never called
                _ => {}
            }
        }
        Ok(abi)
    }

    /// Look up a function by name, or by full signature for overloads.
    ///
    /// `addr` picks the first declared overload, `addr(bytes32,uint256)` an exact one.
    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        let base = name.split('(').next().unwrap_or(name);
        let overloads = self
            .functions
            .get(base)
            .ok_or_else(|| AbiError::WrongInterface(name.to_string()))?;
        let found = if name.contains('(') {
            overloads.iter().find(|f| f.signature() == name)
        } else {
            overloads.first()
        };
        found.ok_or_else(|| AbiError::WrongInterface(name.to_string()))
    }

    pub fn event(&self, name: &str) -> Result<&Event, AbiError> {
        self.events
            .get(name)
            .ok_or_else(|| AbiError::WrongInterface(name.to_string()))
    }

    /// Encode a call: selector followed by the ABI-encoded arguments.
    pub fn encode(&self, function: &str, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let function = self.function(function)?;
        let mut data = function.selector().to_vec();
        data.extend(encode_params(&function.input_types(), args)?);
        Ok(data)
    }

    /// Decode the return data of a call to `function`.
    ///
    /// Empty data decodes to an empty result rather than an error. Data that
    /// carries an `Error(string)` revert surfaces the zero address as the
    /// first output and keeps the reason.
    pub fn decode(&self, function: &str, data: &[u8]) -> Result<Decoded, AbiError> {
        let function = self.function(function)?;
        if data.is_empty() {
            return Ok(Decoded::default());
        }
        if data.starts_with(&REVERT_SELECTOR) {
            let reason = decode_params(&[ParamType::String], &data[REVERT_SELECTOR.len()..])
                .ok()
                .and_then(|mut v| v.pop())
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default();
            let name = function
                .outputs
                .first()
                .map(|p| p.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "0".to_string());
            return Ok(Decoded {
                fields: vec![(name, AbiValue::Address(Address::ZERO))],
                revert_reason: Some(reason),
            });
        }
        let values = decode_params(&function.output_types(), data)?;
        Ok(Decoded::new(&function.outputs, values))
    }

    /// Decode the arguments of call data produced by [`Abi::encode`].
    pub fn decode_input(&self, function: &str, calldata: &[u8]) -> Result<Decoded, AbiError> {
        let function = self.function(function)?;
        let args = calldata
            .strip_prefix(function.selector().as_slice())
            .ok_or_else(|| AbiError::CouldNotDecode(format!("selector mismatch for {}", function.name)))?;
        let values = decode_params(&function.input_types(), args)?;
        Ok(Decoded::new(&function.inputs, values))
    }

    /// Decode a `0x`-prefixed hex string returned by `eth_call`.
    pub fn decode_hex(&self, function: &str, data: &str) -> Result<Decoded, AbiError> {
        self.decode(function, &hex_to_bytes(data)?)
    }

    /// Encode the return data `function` would produce for `values`.
    pub fn encode_output(&self, function: &str, values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let function = self.function(function)?;
        encode_params(&function.output_types(), values)
    }

    pub fn event_topic(&self, event: &str) -> Result<B256, AbiError> {
        Ok(self.event(event)?.topic())
    }

    /// Decode the non-indexed inputs of `event` from a log's data.
    pub fn decode_event_data(&self, event: &str, data: &[u8]) -> Result<Decoded, AbiError> {
        let event = self.event(event)?;
        let params: Vec<Param> = event.inputs.iter().filter(|p| !p.indexed).cloned().collect();
        let values = decode_params(&event.data_types(), data)?;
        Ok(Decoded::new(&params, values))
    }
}

fn parse_params(params: &[JsonParam]) -> Result<Vec<Param>, AbiError> {
    params.iter().map(Param::try_from).collect()
}

/// Parse hex call data, with or without a `0x` prefix.
pub fn hex_to_bytes(data: &str) -> Result<Vec<u8>, AbiError> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    if stripped.len() % 2 != 0 {
        return Err(AbiError::CouldNotDecode(format!("odd-length hex string {data}")));
    }
    hex::decode(stripped).map_err(|e| AbiError::CouldNotDecode(format!("invalid hex: {e}")))
}

/// Format bytes as `0x`-prefixed lowercase hex.
pub fn bytes_to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
