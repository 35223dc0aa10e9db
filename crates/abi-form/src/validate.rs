use num_bigint::{BigInt, Sign};

use crate::error::ValidationError;
use crate::type_signature::{
    element_type, fixed_array_len, is_array_type, is_tuple_type, parse_type_signature,
};
use crate::value::FieldValue;

/// Validate a single primitive value against its Solidity type.
pub fn validate(value: &str, ty: &str) -> Result<(), ValidationError> {
    let ty = ty.trim();
    if ty == "string" {
        return Ok(());
    }
    if value.is_empty() {
        return Err(ValidationError::Empty);
    }

    match ty {
        "bool" => match value {
            "true" | "false" => Ok(()),
            _ => Err(ValidationError::InvalidBool),
        },
        "address" => {
            if is_prefixed_hex(value, Some(40)) {
                Ok(())
            } else {
                Err(ValidationError::InvalidAddress)
            }
        }
        "bytes" => {
            if is_prefixed_hex(value, None) {
                Ok(())
            } else {
                Err(ValidationError::InvalidBytes)
            }
        }
        _ if ty.starts_with("bytes") => {
            let size = ty[5..]
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=32).contains(n))
                .ok_or_else(|| ValidationError::UnsupportedType(ty.to_string()))?;
            if is_prefixed_hex(value, Some(size * 2)) {
                Ok(())
            } else {
                Err(ValidationError::InvalidFixedBytes {
                    ty: ty.to_string(),
                    hex_len: size * 2,
                })
            }
        }
        _ if ty.starts_with("uint") => {
            let bits = integer_width(ty, &ty[4..])?;
            let n = parse_integer(value, ty)?;
            if n.sign() == Sign::Minus {
                return Err(ValidationError::BelowMinimum(ty.to_string()));
            }
            let one = BigInt::from(1u8);
            if n > (&one << bits) - &one {
                return Err(ValidationError::AboveMaximum(ty.to_string()));
            }
            Ok(())
        }
        _ if ty.starts_with("int") => {
            let bits = integer_width(ty, &ty[3..])?;
            let n = parse_integer(value, ty)?;
            let one = BigInt::from(1u8);
            let bound = &one << (bits - 1);
            if n < -bound.clone() {
                return Err(ValidationError::BelowMinimum(ty.to_string()));
            }
            if n > bound - &one {
                return Err(ValidationError::AboveMaximum(ty.to_string()));
            }
            Ok(())
        }
        _ => Err(ValidationError::UnsupportedType(ty.to_string())),
    }
}

/// Validate a structured value, recursing through arrays and tuple members.
pub fn validate_field(value: &FieldValue, ty: &str) -> Result<(), ValidationError> {
    if is_array_type(ty) {
        let FieldValue::Array(items) = value else {
            return Err(ValidationError::InvalidArray(ty.to_string()));
        };
        if let Some(expected) = fixed_array_len(ty) {
            if items.len() != expected {
                return Err(ValidationError::ArrayLength {
                    ty: ty.to_string(),
                    expected,
                    actual: items.len(),
                });
            }
        }
        let item_ty = element_type(ty);
        for (i, item) in items.iter().enumerate() {
            validate_field(item, item_ty).map_err(|e| member_error(i.to_string(), e))?;
        }
        return Ok(());
    }

    if is_tuple_type(ty) {
        let FieldValue::Tuple(members) = value else {
            return Err(ValidationError::InvalidTuple(ty.to_string()));
        };
        for (i, field) in parse_type_signature(ty).iter().enumerate() {
            let key = field.value_key(i);
            let result = match members.get(&key) {
                Some(member) => validate_field(member, &field.ty),
                None => validate_field(&FieldValue::empty_for(&field.ty), &field.ty),
            };
            result.map_err(|e| member_error(key, e))?;
        }
        return Ok(());
    }

    match value {
        FieldValue::Scalar(s) => validate(s, ty),
        _ => Err(ValidationError::UnexpectedComposite(ty.to_string())),
    }
}

/// Validate a field as stored on the wire.
///
/// Blank text is not an empty array; only an explicit `[]` is.
pub fn validate_wire(wire: &str, ty: &str) -> Result<(), ValidationError> {
    if is_array_type(ty) && wire.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    let value = FieldValue::from_wire(wire, ty).map_err(|_| {
        if is_array_type(ty) {
            ValidationError::InvalidArray(ty.to_string())
        } else {
            ValidationError::InvalidTuple(ty.to_string())
        }
    })?;
    validate_field(&value, ty)
}

/// Fields that count as valid before anything is typed.
pub fn is_valid_by_default(ty: &str) -> bool {
    ty.trim() == "string" || (is_tuple_type(ty) && !is_array_type(ty))
}

fn member_error(field: String, source: ValidationError) -> ValidationError {
    ValidationError::Member {
        field,
        source: Box::new(source),
    }
}

fn integer_width(ty: &str, digits: &str) -> Result<usize, ValidationError> {
    if digits.is_empty() {
        return Ok(256);
    }
    match digits.parse::<usize>() {
        Ok(bits) if (8..=256).contains(&bits) && bits % 8 == 0 => Ok(bits),
        _ => Err(ValidationError::UnsupportedType(ty.to_string())),
    }
}

/// Parse a decimal or `0x` hex integer literal with an optional sign.
pub(crate) fn parse_integer(value: &str, ty: &str) -> Result<BigInt, ValidationError> {
    let not_a_number = || ValidationError::NotANumber {
        ty: ty.to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let magnitude = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
            BigInt::parse_bytes(digits.as_bytes(), 16)
        }
        Some(_) => None,
        None if !unsigned.is_empty() && unsigned.chars().all(|c| c.is_ascii_digit()) => {
            BigInt::parse_bytes(unsigned.as_bytes(), 10)
        }
        None => None,
    }
    .ok_or_else(not_a_number)?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// `0x` followed by hex characters; exactly `len` of them when given.
pub(crate) fn is_prefixed_hex(value: &str, len: Option<usize>) -> bool {
    let Some(digits) = value.strip_prefix("0x") else {
        return false;
    };
    digits.chars().all(|c| c.is_ascii_hexdigit()) && len.map_or(true, |l| digits.len() == l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

    #[test]
    fn test_uint8_bounds() {
        assert!(validate("255", "uint8").is_ok());
        assert!(validate("0", "uint8").is_ok());
        assert_eq!(
            validate("256", "uint8"),
            Err(ValidationError::AboveMaximum("uint8".to_string()))
        );
        assert_eq!(
            validate("256", "uint8").unwrap_err().to_string(),
            "Value exceeds maximum for uint8"
        );
        assert_eq!(
            validate("-1", "uint8"),
            Err(ValidationError::BelowMinimum("uint8".to_string()))
        );
    }

    #[test]
    fn test_int8_bounds() {
        assert!(validate("-128", "int8").is_ok());
        assert!(validate("127", "int8").is_ok());
        assert!(matches!(validate("128", "int8"), Err(ValidationError::AboveMaximum(_))));
        assert!(matches!(validate("-129", "int8"), Err(ValidationError::BelowMinimum(_))));
    }

    #[test]
    fn test_uint256_uses_big_integers() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(validate(max, "uint256").is_ok());
        assert!(validate(max, "uint").is_ok());
        assert!(matches!(validate(over, "uint256"), Err(ValidationError::AboveMaximum(_))));

        let int_min = "-57896044618658097711785492504343953926634992332820282019728792003956564819968";
        assert!(validate(int_min, "int256").is_ok());
        assert!(validate("0xff", "uint8").is_ok());
        assert!(validate("0x100", "uint8").is_err());
    }

    #[test]
    fn test_integer_rejects_garbage() {
        assert!(matches!(validate("12a", "uint256"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(validate("1.5", "uint256"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(validate("0x", "uint256"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(validate("-", "int8"), Err(ValidationError::NotANumber { .. })));
    }

    #[test]
    fn test_unsupported_widths() {
        assert!(matches!(validate("1", "uint7"), Err(ValidationError::UnsupportedType(_))));
        assert!(matches!(validate("1", "int264"), Err(ValidationError::UnsupportedType(_))));
        assert!(matches!(validate("0x00", "bytes33"), Err(ValidationError::UnsupportedType(_))));
        assert!(matches!(validate("1", "fixed"), Err(ValidationError::UnsupportedType(_))));
    }

    #[test]
    fn test_address() {
        assert!(validate(ZERO_ADDRESS, "address").is_ok());
        assert!(validate("0xdAC17F958D2ee523a2206206994597C13D831ec7", "address").is_ok());
        assert_eq!(
            validate(&ZERO_ADDRESS[..41], "address"),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(
            validate(&format!("{ZERO_ADDRESS}0"), "address"),
            Err(ValidationError::InvalidAddress)
        );
        assert!(validate("0000000000000000000000000000000000000000", "address").is_err());
    }

    #[test]
    fn test_fixed_bytes() {
        assert!(validate("0x12345678", "bytes4").is_ok());
        assert!(validate("0x123456", "bytes4").is_err());
        assert!(validate("0x123456789a", "bytes4").is_err());
        assert_eq!(
            validate("0x12", "bytes4").unwrap_err().to_string(),
            "Invalid bytes4: expected 0x followed by 8 hex characters"
        );
    }

    #[test]
    fn test_dynamic_bytes_bool_string() {
        assert!(validate("0x", "bytes").is_ok());
        assert!(validate("0xabc", "bytes").is_ok());
        assert!(validate("abc", "bytes").is_err());
        assert!(validate("true", "bool").is_ok());
        assert!(validate("false", "bool").is_ok());
        assert!(validate("True", "bool").is_err());
        assert!(validate("", "string").is_ok());
    }

    #[test]
    fn test_empty_is_rejected() {
        for ty in ["uint8", "int256", "bool", "address", "bytes", "bytes32"] {
            assert_eq!(validate("", ty), Err(ValidationError::Empty), "{ty}");
        }
    }

    #[test]
    fn test_validate_field_tuple() {
        let ty = "(uint8 a, (address b) inner, string note)";
        let mut inner = BTreeMap::new();
        inner.insert("b".to_string(), FieldValue::Scalar(ZERO_ADDRESS.to_string()));
        let mut members = BTreeMap::new();
        members.insert("a".to_string(), FieldValue::Scalar("7".to_string()));
        members.insert("inner".to_string(), FieldValue::Tuple(inner));
        assert!(validate_field(&FieldValue::Tuple(members.clone()), ty).is_ok());

        members.insert("a".to_string(), FieldValue::Scalar("300".to_string()));
        let err = validate_field(&FieldValue::Tuple(members), ty).unwrap_err();
        assert_eq!(err.to_string(), "Field a: Value exceeds maximum for uint8");
    }

    #[test]
    fn test_validate_wire_arrays() {
        assert!(validate_wire(r#"["1","2","3"]"#, "uint8[3]").is_ok());
        assert!(matches!(
            validate_wire(r#"["1","2"]"#, "uint8[3]"),
            Err(ValidationError::ArrayLength { expected: 3, actual: 2, .. })
        ));
        assert!(validate_wire(r#"["1","999"]"#, "uint8[]").is_err());
        assert!(validate_wire("[]", "uint8[]").is_ok());
        assert_eq!(validate_wire("", "uint8[]"), Err(ValidationError::Empty));
        assert_eq!(validate_wire("  ", "(uint8 x)[2]"), Err(ValidationError::Empty));
        assert!(matches!(
            validate_wire("1,2", "uint8[]"),
            Err(ValidationError::InvalidArray(_))
        ));
        assert!(validate_wire(r#"[{"x":"1"},{"x":"2"}]"#, "(uint8 x)[]").is_ok());
        assert!(validate_wire(r#"[["1"],["2","3"]]"#, "uint8[][]").is_ok());
    }

    #[test]
    fn test_valid_by_default() {
        assert!(is_valid_by_default("string"));
        assert!(is_valid_by_default("(uint256 a, bool b)"));
        assert!(!is_valid_by_default("(uint256 a)[]"));
        assert!(!is_valid_by_default("uint256"));
    }
}
