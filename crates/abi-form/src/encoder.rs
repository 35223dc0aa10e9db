use num_bigint::{BigInt, BigUint, Sign};

use crate::abi::ParamType;
use crate::assembler::Literal;
use crate::error::EncodeError;
use crate::signature::FunctionDescriptor;

/// Turns a function descriptor and its literal arguments into calldata.
pub trait CallEncoder {
    fn encode_call(
        &self,
        descriptor: &FunctionDescriptor,
        args: &[Literal],
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Standard Solidity ABI encoder: selector followed by head/tail encoded arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiEncoder;

impl CallEncoder for AbiEncoder {
    fn encode_call(
        &self,
        descriptor: &FunctionDescriptor,
        args: &[Literal],
    ) -> Result<Vec<u8>, EncodeError> {
        let types = descriptor
            .input_types()
            .map_err(|e| EncodeError::InvalidType(e.to_string()))?;
        let mut calldata = descriptor.selector.to_vec();
        calldata.extend(encode_arguments(&types, args)?);
        Ok(calldata)
    }
}

/// ABI-encode a positional argument list (no selector).
pub fn encode_arguments(types: &[ParamType], args: &[Literal]) -> Result<Vec<u8>, EncodeError> {
    if types.len() != args.len() {
        return Err(EncodeError::ArityMismatch {
            expected: types.len(),
            actual: args.len(),
        });
    }
    encode_sequence(types, args)
}

/// Encode values as a tuple: static heads inline, dynamic ones as offsets into the tail.
fn encode_sequence(types: &[ParamType], values: &[Literal]) -> Result<Vec<u8>, EncodeError> {
    let head_len: usize = types.iter().map(head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        let encoded = encode_value(ty, value)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encoded);
        } else {
            head.extend(encoded);
        }
    }

    head.extend(tail);
    Ok(head)
}

/// Bytes a type occupies in the head section.
fn head_size(ty: &ParamType) -> usize {
    if ty.is_dynamic() {
        return 32;
    }
    match ty {
        ParamType::FixedArray(inner, len) => head_size(inner) * len,
        ParamType::Tuple(members) => members.iter().map(head_size).sum(),
        _ => 32,
    }
}

fn encode_value(ty: &ParamType, value: &Literal) -> Result<Vec<u8>, EncodeError> {
    let mismatch = || EncodeError::TypeMismatch {
        ty: ty.canonical(),
        value: value.to_string(),
    };

    match ty {
        ParamType::Address => {
            let bytes = match value {
                Literal::Address(s) => decode_hex(s).ok_or_else(mismatch)?,
                Literal::Hex(s) if s.len() == 42 => decode_hex(s).ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            };
            Ok(left_pad(&bytes).to_vec())
        }
        ParamType::Uint(bits) => {
            let n = literal_integer(value).ok_or_else(mismatch)?;
            let out_of_range = || EncodeError::OutOfRange {
                ty: ty.canonical(),
                value: n.to_string(),
            };
            let unsigned = n.to_biguint().ok_or_else(out_of_range)?;
            if unsigned.bits() > *bits as u64 {
                return Err(out_of_range());
            }
            Ok(biguint_word(&unsigned).to_vec())
        }
        ParamType::Int(bits) => {
            let n = literal_integer(value).ok_or_else(mismatch)?;
            let out_of_range = || EncodeError::OutOfRange {
                ty: ty.canonical(),
                value: n.to_string(),
            };
            let bound = BigInt::from(1u8) << (bits - 1);
            if n < -bound.clone() || n >= bound {
                return Err(out_of_range());
            }
            let twos = if n.sign() == Sign::Minus {
                (BigInt::from(1u8) << 256usize) + &n
            } else {
                n.clone()
            };
            let unsigned = twos.to_biguint().ok_or_else(out_of_range)?;
            Ok(biguint_word(&unsigned).to_vec())
        }
        ParamType::Bool => match value {
            Literal::Bool(b) => Ok(usize_word(usize::from(*b)).to_vec()),
            _ => Err(mismatch()),
        },
        ParamType::FixedBytes(size) => {
            let bytes = match value {
                Literal::Hex(s) | Literal::Address(s) => decode_hex(s).ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            };
            if bytes.len() != *size {
                return Err(mismatch());
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(word.to_vec())
        }
        ParamType::Bytes => match value {
            Literal::Hex(s) | Literal::Address(s) => {
                Ok(encode_dynamic_bytes(&decode_hex(s).ok_or_else(mismatch)?))
            }
            _ => Err(mismatch()),
        },
        ParamType::String => match value {
            Literal::Str(s) => Ok(encode_dynamic_bytes(s.as_bytes())),
            _ => Err(mismatch()),
        },
        ParamType::Array(inner) => {
            let Literal::Array(items) = value else {
                return Err(mismatch());
            };
            let types = vec![inner.as_ref().clone(); items.len()];
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_sequence(&types, items)?);
            Ok(out)
        }
        ParamType::FixedArray(inner, len) => {
            let Literal::Array(items) = value else {
                return Err(mismatch());
            };
            if items.len() != *len {
                return Err(mismatch());
            }
            let types = vec![inner.as_ref().clone(); *len];
            encode_sequence(&types, items)
        }
        ParamType::Tuple(members) => {
            let Literal::Tuple(items) = value else {
                return Err(mismatch());
            };
            if items.len() != members.len() {
                return Err(mismatch());
            }
            encode_sequence(members, items)
        }
    }
}

/// Integer value of a literal, accepting `0x` hex for numeric types.
fn literal_integer(value: &Literal) -> Option<BigInt> {
    match value {
        Literal::Integer(n) => Some(n.clone()),
        Literal::Hex(s) | Literal::Address(s) => {
            let digits = s.strip_prefix("0x")?;
            if digits.is_empty() {
                return None;
            }
            BigInt::parse_bytes(digits.as_bytes(), 16)
        }
        _ => None,
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    hex::decode(s.strip_prefix("0x")?).ok()
}

fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(32) * 32;
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend_from_slice(bytes);
    out.resize(32 + padded_len, 0);
    out
}

fn usize_word(n: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn biguint_word(n: &BigUint) -> [u8; 32] {
    left_pad(&n.to_bytes_be())
}

/// Right-align up to 32 bytes in a word.
fn left_pad(bytes: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    let len = bytes.len().min(32);
    word[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    word
}
