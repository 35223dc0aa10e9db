use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::FormatError;
use crate::type_signature::{element_type, is_array_type, is_tuple_type, parse_type_signature};

/// A field value as edited by the user.
///
/// On the wire (the per-field strings a host stores) scalars are plain
/// strings, arrays are JSON arrays of item strings and tuples are JSON
/// objects mapping member key to member string, nested values being
/// serialized JSON themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    Array(Vec<FieldValue>),
    Tuple(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// The value of a field nobody has typed into yet.
    pub fn empty_for(ty: &str) -> Self {
        if is_array_type(ty) {
            FieldValue::Array(Vec::new())
        } else if is_tuple_type(ty) {
            FieldValue::Tuple(BTreeMap::new())
        } else {
            FieldValue::Scalar(String::new())
        }
    }

    /// Decode a wire string according to `ty`.
    ///
    /// Blank input decodes to the empty value of the type.
    pub fn from_wire(wire: &str, ty: &str) -> Result<Self, FormatError> {
        if !is_array_type(ty) && !is_tuple_type(ty) {
            return Ok(FieldValue::Scalar(wire.to_string()));
        }
        if wire.trim().is_empty() {
            return Ok(Self::empty_for(ty));
        }
        let json: Value = serde_json::from_str(wire).map_err(|_| {
            if is_array_type(ty) {
                FormatError::NotAnArray(wire.to_string())
            } else {
                FormatError::NotAnObject(wire.to_string())
            }
        })?;
        Self::from_json(&json, ty)
    }

    /// Decode an already-parsed JSON value according to `ty`.
    ///
    /// Nested members may be given either structurally or as serialized JSON strings.
    pub fn from_json(json: &Value, ty: &str) -> Result<Self, FormatError> {
        if is_array_type(ty) {
            return match json {
                Value::Array(items) => items
                    .iter()
                    .map(|item| Self::from_json(item, element_type(ty)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::Array),
                Value::String(s) => Self::from_wire(s, ty),
                other => Err(FormatError::NotAnArray(other.to_string())),
            };
        }

        if is_tuple_type(ty) {
            return match json {
                Value::Object(map) => {
                    let mut members = BTreeMap::new();
                    for (i, field) in parse_type_signature(ty).iter().enumerate() {
                        let key = field.value_key(i);
                        if let Some(member) = map.get(&key) {
                            members.insert(key, Self::from_json(member, &field.ty)?);
                        }
                    }
                    Ok(FieldValue::Tuple(members))
                }
                Value::String(s) => Self::from_wire(s, ty),
                other => Err(FormatError::NotAnObject(other.to_string())),
            };
        }

        Ok(FieldValue::Scalar(match json {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }))
    }

    /// Encode back into the wire string representation.
    pub fn to_wire(&self) -> String {
        match self {
            FieldValue::Scalar(s) => s.clone(),
            FieldValue::Array(items) => {
                Value::Array(items.iter().map(|i| Value::String(i.to_wire())).collect())
                    .to_string()
            }
            FieldValue::Tuple(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.to_wire())))
                    .collect(),
            )
            .to_string(),
        }
    }
}
