use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::FormatError;
use crate::linearize::LinearizedParameter;
use crate::type_signature::{element_type, is_array_type, is_tuple_type, parse_type_signature};
use crate::value::FieldValue;

/// Stands in for a tuple member that has no value yet.
pub const PLACEHOLDER: &str = "...";

/// Current per-field strings, keyed by row name.
pub type ParamValues = BTreeMap<String, String>;

/// Render the literal for one field value as it would appear in a call.
///
/// Strings are quoted with `"` and `\` escaped, arrays become `[a, b]` (malformed input
/// becomes `[]`), tuples become `(a, b)` in declared member order.
pub fn format_value(value: &str, ty: &str) -> String {
    let ty = ty.trim();

    if is_array_type(ty) {
        return match FieldValue::from_wire(value, ty) {
            Ok(parsed) => format_field_value(&parsed, ty),
            Err(err) => {
                debug!(ty, %err, "unreadable array value");
                "[]".to_string()
            }
        };
    }

    if is_tuple_type(ty) {
        return format_tuple_with_structure(value, ty).unwrap_or_else(|err| {
            debug!(ty, %err, "structured tuple formatting failed, using fallback");
            format_tuple(value)
        });
    }

    format_scalar(value, ty)
}

/// Render a tuple value (a JSON object keyed by member name) using the
/// member order and types recovered from `type_signature`.
///
/// A malformed member degrades on its own (`[]` for arrays, the
/// placeholder otherwise) while its siblings keep their structure.
pub fn format_tuple_with_structure(
    value: &str,
    type_signature: &str,
) -> Result<String, FormatError> {
    let type_signature = type_signature.trim();
    if is_array_type(type_signature) || !type_signature.starts_with('(') {
        return Err(FormatError::NotATuple(type_signature.to_string()));
    }
    if value.trim().is_empty() {
        return Ok(format_field_value(
            &FieldValue::empty_for(type_signature),
            type_signature,
        ));
    }
    match serde_json::from_str::<Value>(value) {
        Ok(json @ Value::Object(_)) => Ok(format_member(&json, type_signature)),
        _ => Err(FormatError::NotAnObject(value.to_string())),
    }
}

fn format_member(json: &Value, ty: &str) -> String {
    if is_tuple_type(ty) && !is_array_type(ty) {
        let serialized;
        let object = match json {
            Value::Object(map) => Some(map),
            Value::String(s) => {
                serialized = serde_json::from_str::<Value>(s).ok();
                match &serialized {
                    Some(Value::Object(map)) => Some(map),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(map) = object {
            let rendered: Vec<String> = parse_type_signature(ty)
                .iter()
                .enumerate()
                .map(|(i, field)| match map.get(&field.value_key(i)) {
                    Some(member) => format_member(member, &field.ty),
                    None => PLACEHOLDER.to_string(),
                })
                .collect();
            return format!("({})", rendered.join(", "));
        }
    }

    match FieldValue::from_json(json, ty) {
        Ok(parsed) => format_field_value(&parsed, ty),
        Err(err) => {
            debug!(ty, %err, "unreadable tuple member");
            if is_array_type(ty) {
                "[]".to_string()
            } else {
                PLACEHOLDER.to_string()
            }
        }
    }
}

/// Render an already-decoded value against its type.
pub fn format_field_value(value: &FieldValue, ty: &str) -> String {
    match value {
        FieldValue::Scalar(s) => format_scalar(s, ty),
        FieldValue::Array(items) => {
            let item_ty = element_type(ty);
            let rendered: Vec<String> = items
                .iter()
                .map(|item| format_field_value(item, item_ty))
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        FieldValue::Tuple(members) => {
            let rendered: Vec<String> = parse_type_signature(ty)
                .iter()
                .enumerate()
                .map(|(i, field)| match members.get(&field.value_key(i)) {
                    Some(member) => format_field_value(member, &field.ty),
                    None => PLACEHOLDER.to_string(),
                })
                .collect();
            format!("({})", rendered.join(", "))
        }
    }
}

fn format_scalar(value: &str, ty: &str) -> String {
    if ty.trim() == "string" {
        quote_string(value)
    } else {
        value.to_string()
    }
}

/// Wrap text in double quotes, escaping `\` and `"`.
pub(crate) fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Best-effort tuple rendering without type information.
///
/// Scalar members come first in insertion order, then members that look
/// like nested tuples. Never fails: unreadable input renders as the placeholder.
pub fn format_tuple(value: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(value) else {
        return PLACEHOLDER.to_string();
    };

    let mut scalars = Vec::new();
    let mut nested = Vec::new();
    for member in map.values() {
        let wire = match member {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if wire.trim_start().starts_with('{') {
            nested.push(format_tuple(&wire));
        } else {
            scalars.push(format_loose_scalar(&wire));
        }
    }

    scalars.extend(nested);
    format!("({})", scalars.join(", "))
}

/// Quote text that does not already read as a literal.
fn format_loose_scalar(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        return if looks_like_literal(inner) {
            inner.to_string()
        } else {
            trimmed.to_string()
        };
    }
    if looks_like_literal(trimmed) || trimmed.starts_with('[') {
        trimmed.to_string()
    } else {
        quote_string(value)
    }
}

fn looks_like_literal(s: &str) -> bool {
    if s == "true" || s == "false" {
        return true;
    }
    if let Some(hex) = s.strip_prefix("0x") {
        return hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit())
}

/// Join the formatted top-level values in parameter order.
pub fn format_preview(params: &[LinearizedParameter], values: &ParamValues) -> String {
    params
        .iter()
        .map(|p| {
            let value = values.get(&p.name).map(String::as_str).unwrap_or_default();
            format_value(value, &p.ty)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
