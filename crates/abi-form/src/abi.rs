use tiny_keccak::{Hasher, Keccak};

use crate::error::EncodeError;
use crate::type_signature::{parse_type_signature, split_array_suffix};

/// ABI parameter types — recursive to support tuples and arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint(usize),
    Int(usize),
    Bool,
    Bytes,
    FixedBytes(usize),
    String,
    Array(Box<ParamType>),
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parse a Solidity type string.
    ///
    /// Accepts canonical types (`uint256`, `(address,bool)[]`) as well as
    /// expanded tuple signatures with member names (`(address to, bool ok)`).
    pub fn parse(s: &str) -> Result<Self, EncodeError> {
        let s = s.trim();

        // Handle array suffixes: `type[]` or `type[N]`
        if s.ends_with(']') {
            if let Some(bracket_pos) = s.rfind('[') {
                let inner = Self::parse(&s[..bracket_pos])?;
                let size_str = s[bracket_pos + 1..s.len() - 1].trim();
                if size_str.is_empty() {
                    return Ok(ParamType::Array(Box::new(inner)));
                }
                let size: usize = size_str
                    .parse()
                    .map_err(|_| EncodeError::InvalidType(format!("invalid array size: {s}")))?;
                return Ok(ParamType::FixedArray(Box::new(inner), size));
            }
        }

        // Handle tuples: `(type1 name1, type2 name2, ...)`
        if s.starts_with('(') && s.ends_with(')') {
            let members = parse_type_signature(s)
                .iter()
                .map(|field| Self::parse(&field.ty))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ParamType::Tuple(members));
        }

        match s {
            "address" | "address payable" => Ok(ParamType::Address),
            "bool" => Ok(ParamType::Bool),
            "string" => Ok(ParamType::String),
            "bytes" => Ok(ParamType::Bytes),
            _ if s.starts_with("uint") => Ok(ParamType::Uint(int_width(s, &s[4..])?)),
            _ if s.starts_with("int") => Ok(ParamType::Int(int_width(s, &s[3..])?)),
            _ if s.starts_with("bytes") => {
                let size: usize = s[5..]
                    .parse()
                    .map_err(|_| EncodeError::InvalidType(s.to_string()))?;
                if !(1..=32).contains(&size) {
                    return Err(EncodeError::InvalidType(s.to_string()));
                }
                Ok(ParamType::FixedBytes(size))
            }
            _ => Err(EncodeError::InvalidType(s.to_string())),
        }
    }

    /// Whether this type is dynamically-sized in ABI encoding.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String => true,
            ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(members) => members.iter().any(|m| m.is_dynamic()),
            _ => false,
        }
    }

    /// Canonical type string used for selector computation.
    pub fn canonical(&self) -> String {
        match self {
            ParamType::Address => "address".to_string(),
            ParamType::Uint(bits) => format!("uint{bits}"),
            ParamType::Int(bits) => format!("int{bits}"),
            ParamType::Bool => "bool".to_string(),
            ParamType::Bytes => "bytes".to_string(),
            ParamType::FixedBytes(size) => format!("bytes{size}"),
            ParamType::String => "string".to_string(),
            ParamType::Array(inner) => format!("{}[]", inner.canonical()),
            ParamType::FixedArray(inner, size) => format!("{}[{size}]", inner.canonical()),
            ParamType::Tuple(members) => format!("({})", canonical_params(members)),
        }
    }

    /// Wrap `self` in the array dimensions described by `suffix` (`"[2][]"`).
    pub fn with_array_suffix(self, suffix: &str) -> Result<Self, EncodeError> {
        let mut ty = self;
        let mut rest = suffix.trim();
        while let Some(after_open) = rest.strip_prefix('[') {
            let close = after_open
                .find(']')
                .ok_or_else(|| EncodeError::InvalidType(format!("invalid array suffix: {suffix}")))?;
            let size_str = after_open[..close].trim();
            ty = if size_str.is_empty() {
                ParamType::Array(Box::new(ty))
            } else {
                let size = size_str.parse().map_err(|_| {
                    EncodeError::InvalidType(format!("invalid array size: {size_str}"))
                })?;
                ParamType::FixedArray(Box::new(ty), size)
            };
            rest = after_open[close + 1..].trim_start();
        }
        Ok(ty)
    }
}

fn int_width(ty: &str, digits: &str) -> Result<usize, EncodeError> {
    if digits.is_empty() {
        return Ok(256);
    }
    let bits: usize = digits
        .parse()
        .map_err(|_| EncodeError::InvalidType(ty.to_string()))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(EncodeError::InvalidType(ty.to_string()));
    }
    Ok(bits)
}

/// Build a canonical param string for selector computation.
pub fn canonical_params(params: &[ParamType]) -> String {
    params
        .iter()
        .map(ParamType::canonical)
        .collect::<Vec<_>>()
        .join(",")
}

/// Normalize a type alias to its canonical spelling, keeping any array suffix.
///
/// `uint[]` → `uint256[]`, `int` → `int256`, `address payable` → `address`.
pub fn normalize_type_alias(ty: &str) -> String {
    let (base, suffix) = split_array_suffix(ty);
    let base = match base {
        "uint" => "uint256",
        "int" => "int256",
        "address payable" => "address",
        other => other,
    };
    format!("{base}{suffix}")
}

/// Compute the 4-byte selector from a canonical function signature.
pub fn selector_from_signature(canonical: &str) -> [u8; 4] {
    let mut hasher = Keccak::v256();
    hasher.update(canonical.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
