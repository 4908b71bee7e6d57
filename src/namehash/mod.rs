//! Hierarchical domain hashing.
//!
//! A domain is hashed label by label from the TLD down, starting from the
//! all-zero root: `node = H(node ++ H(label))`. The hash primitive depends on
//! the naming service family.

use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash chain used to derive child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashChain {
    /// keccak256, as used by UNS, CNS and ENS
    Keccak,
    /// sha256, as used by ZNS on Zilliqa
    Sha256,
}

impl HashChain {
    fn hash(self, data: &[u8]) -> B256 {
        match self {
            HashChain::Keccak => keccak256(data),
            HashChain::Sha256 => B256::from_slice(&Sha256::digest(data)),
        }
    }

    /// `H(parent ++ H(label))`
    pub fn child(self, parent: B256, label: &str) -> B256 {
        let label_hash = self.hash(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(parent.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        self.hash(&buf)
    }
}

/// The 32-byte on-chain key of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(B256);

impl TokenId {
    /// The id of the empty name.
    pub const ROOT: TokenId = TokenId(B256::ZERO);

    pub fn as_b256(&self) -> B256 {
        self.0
    }

    /// The id as a `uint256` contract argument.
    pub fn as_u256(&self) -> U256 {
        U256::from_be_bytes(self.0 .0)
    }

    pub fn from_u256(value: U256) -> Self {
        TokenId(B256::from(value.to_be_bytes::<32>()))
    }

    /// `0x`-prefixed, 64 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// Parse a token id from hex, with or without `0x`; shorter values are left-padded.
    pub fn from_hex(s: &str) -> Option<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.is_empty() || stripped.len() > 64 {
            return None;
        }
        U256::from_str_radix(stripped, 16).ok().map(Self::from_u256)
    }
}

impl From<B256> for TokenId {
    fn from(value: B256) -> Self {
        TokenId(value)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compute the token id of `domain` under `chain`.
///
/// The empty string is the root. No normalisation is applied; callers
/// lower-case and trim before hashing.
pub fn namehash(domain: &str, chain: HashChain) -> TokenId {
    if domain.is_empty() {
        return TokenId::ROOT;
    }
    let node = domain
        .rsplit('.')
        .fold(B256::ZERO, |parent, label| chain.child(parent, label));
    TokenId(node)
}
