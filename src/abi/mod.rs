//! Contract ABI codec
//!
//! Encodes call arguments and decodes return data and event logs against
//! JSON ABI descriptors. Everything here is pure and safe to share across
//! tasks.

pub mod codec;
pub mod errors;
pub mod interface;
pub mod selectors;
pub mod types;
pub mod value;

pub use codec::{decode_params, encode_params};
pub use errors::AbiError;
pub use interface::{bytes_to_hex, hex_to_bytes, Abi, Decoded, Event, Function};
pub use selectors::{event_topic, function_selector};
pub use types::{Param, ParamType};
pub use value::AbiValue;

use std::sync::Arc;

const PROXY_READER_ABI: &str = include_str!("contracts/proxy_reader.json");
const REGISTRY_ABI: &str = include_str!("contracts/registry.json");
const ENS_REGISTRY_ABI: &str = include_str!("contracts/ens_registry.json");
const ENS_RESOLVER_ABI: &str = include_str!("contracts/ens_resolver.json");

/// Descriptor sets of every contract the naming services talk to.
///
/// Built once and handed to the adapters at construction.
#[derive(Debug, Clone)]
pub struct ContractAbis {
    pub proxy_reader: Arc<Abi>,
    /// UNS and legacy CNS registries (events and `ownerOf`)
    pub registry: Arc<Abi>,
    pub ens_registry: Arc<Abi>,
    pub ens_resolver: Arc<Abi>,
}

impl ContractAbis {
    /// Parse the ABIs bundled with the crate.
    pub fn bundled() -> Result<Self, AbiError> {
        Ok(Self {
            proxy_reader: Arc::new(Abi::from_json(PROXY_READER_ABI)?),
            registry: Arc::new(Abi::from_json(REGISTRY_ABI)?),
            ens_registry: Arc::new(Abi::from_json(ENS_REGISTRY_ABI)?),
            ens_resolver: Arc::new(Abi::from_json(ENS_RESOLVER_ABI)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NEW_URI_EVENT, REVERT_SELECTOR, TRANSFER_EVENT};
    use alloy_primitives::{Address, U256};

    fn abis() -> ContractAbis {
        ContractAbis::bundled().unwrap()
    }

    #[test]
    fn test_bundled_abis_parse() {
        let abis = abis();
        assert!(abis.proxy_reader.function("getData").is_ok());
        assert!(abis.proxy_reader.function("multicall").is_ok());
        assert!(abis.registry.event("Transfer").is_ok());
        assert!(abis.ens_registry.function("resolver").is_ok());
        assert!(abis.ens_resolver.function("text").is_ok());
    }

    #[test]
    fn test_signatures_are_canonical() {
        let abis = abis();
        assert_eq!(
            abis.proxy_reader.function("getData").unwrap().signature(),
            "getData(string[],uint256)"
        );
        assert_eq!(abis.registry.event("Transfer").unwrap().signature(), TRANSFER_EVENT);
        assert_eq!(abis.registry.event("NewURI").unwrap().signature(), NEW_URI_EVENT);
        assert_eq!(
            abis.registry.event_topic("Transfer").unwrap(),
            event_topic(TRANSFER_EVENT)
        );
    }

    #[test]
    fn test_overloads_resolve_by_signature() {
        let abis = abis();
        let plain = abis.ens_resolver.function("addr").unwrap();
        assert_eq!(plain.signature(), "addr(bytes32)");
        let coin = abis.ens_resolver.function("addr(bytes32,uint256)").unwrap();
        assert_eq!(coin.outputs[0].kind, ParamType::Bytes);
        assert!(abis.ens_resolver.function("addr(uint256)").is_err());
    }

    #[test]
    fn test_unknown_function_is_wrong_interface() {
        let abis = abis();
        let err = abis.proxy_reader.encode("transfer", &[]).unwrap_err();
        assert_eq!(err, AbiError::WrongInterface("transfer".into()));
        assert!(matches!(
            abis.registry.event("Approval").unwrap_err(),
            AbiError::WrongInterface(_)
        ));
    }

    #[test]
    fn test_encode_starts_with_selector() {
        let abis = abis();
        let data = abis
            .proxy_reader
            .encode("ownerOf", &[AbiValue::Uint(U256::from(1))])
            .unwrap();
        assert_eq!(&data[..4], &function_selector("ownerOf(uint256)"));
        assert_eq!(data.len(), 36);
    }

    #[test]
    fn test_decode_round_trip_by_name() {
        let abis = abis();
        let owner = Address::repeat_byte(0x42);
        let resolver = Address::repeat_byte(0x24);
        let values = vec![
            AbiValue::Address(resolver),
            AbiValue::Address(owner),
            AbiValue::string_list(["0xabc", ""]),
        ];
        let data = abis.proxy_reader.encode_output("getData", &values).unwrap();
        let decoded = abis.proxy_reader.decode("getData", &data).unwrap();
        assert_eq!(decoded.get("owner").and_then(AbiValue::as_address), Some(owner));
        assert_eq!(decoded.get("resolver").and_then(AbiValue::as_address), Some(resolver));
        assert_eq!(
            decoded.get("values").and_then(AbiValue::to_string_list),
            Some(vec!["0xabc".to_string(), String::new()])
        );
        assert_eq!(decoded.into_values(), values);
    }

    #[test]
    fn test_unnamed_outputs_are_keyed_by_position() {
        let abis = abis();
        let data = abis
            .proxy_reader
            .encode_output("exists", &[AbiValue::Bool(true)])
            .unwrap();
        let decoded = abis.proxy_reader.decode("exists", &data).unwrap();
        assert_eq!(decoded.get("0").and_then(AbiValue::as_bool), Some(true));
        assert_eq!(decoded.at(0), decoded.get("0"));
    }

    #[test]
    fn test_empty_return_data_is_absent_not_error() {
        let abis = abis();
        let decoded = abis.proxy_reader.decode("ownerOf", &[]).unwrap();
        assert!(decoded.is_empty());
        assert!(decoded.get("0").is_none());
        assert!(abis.proxy_reader.decode_hex("ownerOf", "0x").unwrap().is_empty());
    }

    #[test]
    fn test_revert_preamble_surfaces_zero_address() {
        let abis = abis();
        let mut data = REVERT_SELECTOR.to_vec();
        data.extend(encode_params(&[ParamType::String], &[AbiValue::from("not found")]).unwrap());
        let decoded = abis.proxy_reader.decode("ownerOf", &data).unwrap();
        assert_eq!(decoded.at(0).and_then(AbiValue::as_address), Some(Address::ZERO));
        assert_eq!(decoded.revert_reason(), Some("not found"));
    }

    #[test]
    fn test_odd_length_hex_is_could_not_decode() {
        let abis = abis();
        let err = abis.proxy_reader.decode_hex("ownerOf", "0xabc").unwrap_err();
        assert!(matches!(err, AbiError::CouldNotDecode(_)));
        assert!(matches!(hex_to_bytes("zz").unwrap_err(), AbiError::CouldNotDecode(_)));
    }

    #[test]
    fn test_event_data_skips_indexed_inputs() {
        let abis = abis();
        let data = encode_params(&[ParamType::String], &[AbiValue::from("brad.crypto")]).unwrap();
        let decoded = abis.registry.decode_event_data("NewURI", &data).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get("uri").and_then(AbiValue::as_str), Some("brad.crypto"));
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(bytes_to_hex(&[0x0a, 0xff]), "0x0aff");
        assert_eq!(hex_to_bytes("0x0aff").unwrap(), vec![0x0a, 0xff]);
        assert_eq!(hex_to_bytes("0AFF").unwrap(), vec![0x0a, 0xff]);
    }
}
