use alloy_primitives::{Address, B256, I256, U256};

/// A typed ABI value, used both as a call argument and as a decoded result.
///
/// Arguments are matched against their [`ParamType`](super::ParamType) at
/// encode time; a mismatch is reported as `CouldNotEncode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// Elements of a dynamic or fixed-size array
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }

    /// Array of strings, e.g. a list of record keys.
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AbiValue::Array(items.into_iter().map(|s| AbiValue::String(s.into())).collect())
    }

    /// Array of unsigned integers, e.g. a list of token ids.
    pub fn uint_list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = U256>,
    {
        AbiValue::Array(items.into_iter().map(AbiValue::Uint).collect())
    }

    /// Array of byte strings, e.g. the sub-calls of a multicall.
    pub fn bytes_list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        AbiValue::Array(items.into_iter().map(AbiValue::Bytes).collect())
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of a `bytes` or `bytesN` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(b) | AbiValue::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(items) | AbiValue::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Elements of a `string[]`, or `None` if any element is not a string.
    pub fn to_string_list(&self) -> Option<Vec<String>> {
        self.as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect()
    }

    /// Elements of an `address[]`.
    pub fn to_address_list(&self) -> Option<Vec<Address>> {
        self.as_array()?.iter().map(AbiValue::as_address).collect()
    }

    /// Elements of a `bytes[]`.
    pub fn to_bytes_list(&self) -> Option<Vec<Vec<u8>>> {
        self.as_array()?
            .iter()
            .map(|v| v.as_bytes().map(<[u8]>::to_vec))
            .collect()
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        AbiValue::Address(value)
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        AbiValue::Bool(value)
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        AbiValue::Uint(value)
    }
}

impl From<I256> for AbiValue {
    fn from(value: I256) -> Self {
        AbiValue::Int(value)
    }
}

impl From<B256> for AbiValue {
    fn from(value: B256) -> Self {
        AbiValue::FixedBytes(value.to_vec())
    }
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        AbiValue::String(value.to_owned())
    }
}

impl From<String> for AbiValue {
    fn from(value: String) -> Self {
        AbiValue::String(value)
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(value: Vec<u8>) -> Self {
        AbiValue::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_helpers() {
        let keys = AbiValue::string_list(["a", "b"]);
        assert_eq!(keys.to_string_list(), Some(vec!["a".to_string(), "b".to_string()]));

        let ids = AbiValue::uint_list([U256::from(1), U256::from(2)]);
        assert_eq!(ids.as_array().map(<[AbiValue]>::len), Some(2));
        assert_eq!(ids.to_string_list(), None);
    }

    #[test]
    fn test_accessors_reject_other_variants() {
        let value = AbiValue::from("text");
        assert_eq!(value.as_str(), Some("text"));
        assert_eq!(value.as_address(), None);
        assert_eq!(value.as_uint(), None);
        assert_eq!(AbiValue::from(true).as_bool(), Some(true));
    }
}
