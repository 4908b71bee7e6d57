use alloy_primitives::{Address, B256};

/// Encode an address into a 32-byte log topic (left-padded).
pub fn encode_address(addr: Address) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[12..32].copy_from_slice(addr.as_slice());
    B256::from(bytes)
}

/// Treat the zero address as "not set".
pub fn non_zero(addr: Address) -> Option<Address> {
    (!addr.is_zero()).then_some(addr)
}
