use super::AbiError;
use crate::constants::WORD_SIZE;
use serde::Deserialize;
use std::fmt;

/// Type descriptor of a single ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Bool,
    /// Unsigned integer of the given bit width (8..=256)
    Uint(usize),
    /// Signed integer of the given bit width (8..=256)
    Int(usize),
    /// `bytesN` with N in 1..=32
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<ParamType>),
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<Param>),
}

/// A named parameter of a function, event or tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamType,
    /// Only meaningful for event inputs
    pub indexed: bool,
}

impl ParamType {
    /// Whether the encoded width of this type depends on its value.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(params) => params.iter().any(|p| p.kind.is_dynamic()),
            _ => false,
        }
    }

    /// Bytes taken in the head of an enclosing sequence.
    ///
    /// Dynamic types take one offset word; static types are laid out inline.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD_SIZE;
        }
        match self {
            ParamType::FixedArray(inner, len) => inner.head_size() * len,
            ParamType::Tuple(params) => params.iter().map(|p| p.kind.head_size()).sum(),
            _ => WORD_SIZE,
        }
    }

    /// Parse a Solidity type string such as `uint256`, `string[]` or `bytes32[2]`.
    ///
    /// `components` supplies the members when the base type is `tuple`.
    pub fn parse(ty: &str, components: &[Param]) -> Result<Self, AbiError> {
        let ty = ty.trim();
        if let Some(stripped) = ty.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| AbiError::WrongInterface(format!("malformed type {ty}")))?;
            let inner = Box::new(Self::parse(&stripped[..open], components)?);
            let size = &stripped[open + 1..];
            if size.is_empty() {
                return Ok(ParamType::Array(inner));
            }
            let len = size
                .parse::<usize>()
                .map_err(|_| AbiError::WrongInterface(format!("malformed array size in {ty}")))?;
            return Ok(ParamType::FixedArray(inner, len));
        }

        match ty {
            "address" => Ok(ParamType::Address),
            "bool" => Ok(ParamType::Bool),
            "string" => Ok(ParamType::String),
            "bytes" => Ok(ParamType::Bytes),
            "uint" => Ok(ParamType::Uint(256)),
            "int" => Ok(ParamType::Int(256)),
            "tuple" => Ok(ParamType::Tuple(components.to_vec())),
            _ => {
                if let Some(bits) = ty.strip_prefix("uint") {
                    return parse_width(ty, bits).map(ParamType::Uint);
                }
                if let Some(bits) = ty.strip_prefix("int") {
                    return parse_width(ty, bits).map(ParamType::Int);
                }
                if let Some(len) = ty.strip_prefix("bytes") {
                    return match len.parse::<usize>() {
                        Ok(n) if (1..=32).contains(&n) => Ok(ParamType::FixedBytes(n)),
                        _ => Err(AbiError::WrongInterface(format!("unsupported type {ty}"))),
                    };
                }
                Err(AbiError::WrongInterface(format!("unsupported type {ty}")))
            }
        }
    }
}

fn parse_width(ty: &str, bits: &str) -> Result<usize, AbiError> {
    match bits.parse::<usize>() {
        Ok(n) if n > 0 && n <= 256 && n % 8 == 0 => Ok(n),
        _ => Err(AbiError::WrongInterface(format!("unsupported type {ty}"))),
    }
}

/// Canonical form, as used in function and event signatures.
impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::FixedBytes(len) => write!(f, "bytes{len}"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            ParamType::Tuple(params) => {
                f.write_str("(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", p.kind)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Parameter as it appears in a JSON ABI.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub components: Vec<JsonParam>,
    #[serde(default)]
    pub indexed: bool,
}

impl TryFrom<&JsonParam> for Param {
    type Error = AbiError;

    fn try_from(json: &JsonParam) -> Result<Self, Self::Error> {
        let components = json
            .components
            .iter()
            .map(Param::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Param {
            name: json.name.clone(),
            kind: ParamType::parse(&json.ty, &components)?,
            indexed: json.indexed,
        })
    }
}
