use alloy_primitives::{keccak256, B256};

/// Compute the Solidity function selector (first 4 bytes of keccak256(signature)).
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Compute the topic of a non-anonymous event (keccak256(signature)).
pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}
