//! Head/tail encoding of ABI parameter sequences.
//!
//! A sequence is laid out as a head of fixed-width slots followed by a tail
//! of dynamic payloads. Static values live in the head; dynamic values put a
//! byte offset (relative to the start of the sequence) into the head and
//! their payload into the tail.

use super::{AbiError, AbiValue, ParamType};
use crate::constants::WORD_SIZE;
use alloy_primitives::{I256, U256};

/// Encode `values` as a sequence of `types` (no selector).
pub fn encode_params(types: &[ParamType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let types: Vec<&ParamType> = types.iter().collect();
    encode_sequence(&types, values)
}

/// Decode a sequence of `types` from `data` (no selector).
pub fn decode_params(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let types: Vec<&ParamType> = types.iter().collect();
    decode_sequence(&types, data, 0)
}

fn encode_sequence(types: &[&ParamType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::CouldNotEncode(format!(
            "expected {} values, got {}",
            types.len(),
            values.len()
        )));
    }

    let head_len: usize = types.iter().map(|t| t.head_size()).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        let encoded = encode_value(ty, value)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend_from_slice(&encoded);
        } else {
            head.extend_from_slice(&encoded);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_value(ty: &ParamType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    match (ty, value) {
        (ParamType::Address, AbiValue::Address(addr)) => {
            let mut word = [0u8; WORD_SIZE];
            word[12..].copy_from_slice(addr.as_slice());
            Ok(word.to_vec())
        }
        (ParamType::Bool, AbiValue::Bool(b)) => Ok(usize_word(usize::from(*b)).to_vec()),
        (ParamType::Uint(bits), AbiValue::Uint(n)) => {
            if n.bit_len() > *bits {
                return Err(AbiError::CouldNotEncode(format!("{n} does not fit in uint{bits}")));
            }
            Ok(n.to_be_bytes::<32>().to_vec())
        }
        (ParamType::Int(bits), AbiValue::Int(n)) => {
            if !int_fits(*n, *bits) {
                return Err(AbiError::CouldNotEncode(format!("{n} does not fit in int{bits}")));
            }
            Ok(n.into_raw().to_be_bytes::<32>().to_vec())
        }
        (ParamType::FixedBytes(len), AbiValue::FixedBytes(bytes)) => {
            if *len > WORD_SIZE {
                return Err(AbiError::CouldNotEncode(format!("bytes{len} is wider than a word")));
            }
            if bytes.len() != *len {
                return Err(AbiError::CouldNotEncode(format!(
                    "expected bytes{len}, got {} bytes",
                    bytes.len()
                )));
            }
            Ok(pad_right(bytes))
        }
        (ParamType::Bytes, AbiValue::Bytes(bytes)) => Ok(encode_dynamic_bytes(bytes)),
        (ParamType::String, AbiValue::String(s)) => Ok(encode_dynamic_bytes(s.as_bytes())),
        (ParamType::Array(inner), AbiValue::Array(items)) => {
            let types = vec![&**inner; items.len()];
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_sequence(&types, items)?);
            Ok(out)
        }
        (ParamType::FixedArray(inner, len), AbiValue::Array(items)) => {
            if items.len() != *len {
                return Err(AbiError::CouldNotEncode(format!(
                    "expected {len} array elements, got {}",
                    items.len()
                )));
            }
            let types = vec![&**inner; *len];
            encode_sequence(&types, items)
        }
        (ParamType::Tuple(params), AbiValue::Tuple(items)) => {
            let types: Vec<&ParamType> = params.iter().map(|p| &p.kind).collect();
            encode_sequence(&types, items)
        }
        (ty, value) => Err(AbiError::CouldNotEncode(format!(
            "cannot encode {} as {ty}",
            value.kind()
        ))),
    }
}

fn int_fits(n: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let magnitude = if n.is_negative() { !n.into_raw() } else { n.into_raw() };
    magnitude.bit_len() < bits
}

fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend(pad_right(bytes));
    out
}

fn pad_right(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
    let mut out = bytes.to_vec();
    out.resize(padded_len, 0);
    out
}

fn usize_word(n: usize) -> [u8; WORD_SIZE] {
    U256::from(n).to_be_bytes::<32>()
}

fn decode_sequence(
    types: &[&ParamType],
    data: &[u8],
    base: usize,
) -> Result<Vec<AbiValue>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    let mut cursor = base;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let start = base
                .checked_add(offset)
                .filter(|start| *start <= data.len())
                .ok_or_else(|| out_of_bounds("offset", offset, data.len()))?;
            values.push(decode_value(ty, data, start)?);
            cursor += WORD_SIZE;
        } else {
            values.push(decode_value(ty, data, cursor)?);
            cursor += ty.head_size();
        }
    }

    Ok(values)
}

fn decode_value(ty: &ParamType, data: &[u8], at: usize) -> Result<AbiValue, AbiError> {
    match ty {
        ParamType::Address => {
            let word = read_word(data, at)?;
            Ok(AbiValue::Address(alloy_primitives::Address::from_slice(&word[12..])))
        }
        ParamType::Bool => Ok(AbiValue::Bool(read_word(data, at)?.iter().any(|b| *b != 0))),
        ParamType::Uint(_) => Ok(AbiValue::Uint(U256::from_be_slice(read_word(data, at)?))),
        ParamType::Int(_) => Ok(AbiValue::Int(I256::from_raw(U256::from_be_slice(
            read_word(data, at)?,
        )))),
        ParamType::FixedBytes(len) => read_word(data, at)?
            .get(..*len)
            .map(|bytes| AbiValue::FixedBytes(bytes.to_vec()))
            .ok_or_else(|| AbiError::CouldNotDecode(format!("bytes{len} is wider than a word"))),
        ParamType::Bytes => Ok(AbiValue::Bytes(read_dynamic_bytes(data, at)?.to_vec())),
        ParamType::String => {
            let bytes = read_dynamic_bytes(data, at)?;
            String::from_utf8(bytes.to_vec())
                .map(AbiValue::String)
                .map_err(|_| AbiError::CouldNotDecode("string is not valid UTF-8".into()))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, at)?;
            let start = at + WORD_SIZE;
            // every element takes at least one word of head
            let available = data.len().saturating_sub(start) / WORD_SIZE;
            if len > available {
                return Err(out_of_bounds("array length", len, available));
            }
            let types = vec![&**inner; len];
            decode_sequence(&types, data, start).map(AbiValue::Array)
        }
        ParamType::FixedArray(inner, len) => {
            let types = vec![&**inner; *len];
            decode_sequence(&types, data, at).map(AbiValue::Array)
        }
        ParamType::Tuple(params) => {
            let types: Vec<&ParamType> = params.iter().map(|p| &p.kind).collect();
            decode_sequence(&types, data, at).map(AbiValue::Tuple)
        }
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    at.checked_add(WORD_SIZE)
        .and_then(|end| data.get(at..end))
        .ok_or_else(|| out_of_bounds("word", at, data.len()))
}

/// Read a word that must hold a length or offset no larger than the data itself.
fn read_usize(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let value = U256::from_be_slice(read_word(data, at)?);
    usize::try_from(value)
        .ok()
        .filter(|n| *n <= data.len())
        .ok_or_else(|| AbiError::CouldNotDecode(format!("length or offset {value} is out of bounds")))
}

fn read_dynamic_bytes(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    let len = read_usize(data, at)?;
    let start = at + WORD_SIZE;
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| out_of_bounds("bytes", len, data.len()))
}

fn out_of_bounds(what: &str, value: usize, limit: usize) -> AbiError {
    AbiError::CouldNotDecode(format!("{what} {value} is out of bounds ({limit})"))
}
