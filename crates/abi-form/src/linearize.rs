use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::signature::{FunctionDescriptor, ParameterNode};
use crate::type_signature::{
    base_type, is_array_type, is_tuple_type, parse_type_signature, split_array_suffix,
};

/// One renderable row of a function's parameter list.
///
/// Tuple rows carry their fully expanded signature in `ty`
/// (`(uint256 a, address b)[]`); their members are not separate rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearizedParameter {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    pub depth: usize,
    pub path: String,
}

impl LinearizedParameter {
    /// Dotted path of this row including its own name.
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.path, self.name)
        }
    }

    /// Whether the row is a tuple (not an array of tuples).
    pub fn is_tuple(&self) -> bool {
        is_tuple_type(&self.ty) && !is_array_type(&self.ty)
    }

    /// Rows for this tuple's members, one level deeper, for recursive sub-rendering.
    ///
    /// Unnamed members are keyed by position. Non-tuple rows have no members.
    pub fn sub_parameters(&self) -> Vec<LinearizedParameter> {
        if !self.is_tuple() {
            return Vec::new();
        }
        let path = self.full_path();
        parse_type_signature(&self.ty)
            .into_iter()
            .enumerate()
            .map(|(i, field)| LinearizedParameter {
                name: field.value_key(i),
                ty: field.ty,
                depth: self.depth + 1,
                path: path.clone(),
            })
            .collect()
    }
}

/// Flatten a function's inputs into one row per top-level parameter, in order.
///
/// Row names are unique. Declared names win; a synthetic or repeated name
/// that clashes with another row gets a numeric suffix (`address_1_1`).
pub fn linearize(descriptor: &FunctionDescriptor) -> Vec<LinearizedParameter> {
    let declared: BTreeSet<&str> = descriptor
        .inputs
        .iter()
        .map(|node| node.name.as_str())
        .filter(|name| !name.is_empty())
        .collect();
    let mut claimed: BTreeSet<String> = BTreeSet::new();

    descriptor
        .inputs
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let preferred = parameter_name(node, index);
            let reserved = !node.name.is_empty() && !claimed.contains(&preferred);
            let name = if reserved {
                preferred
            } else {
                unique_name(&preferred, &declared, &claimed)
            };
            claimed.insert(name.clone());
            LinearizedParameter {
                ty: display_type(node),
                name,
                depth: 0,
                path: String::new(),
            }
        })
        .collect()
}

fn unique_name(preferred: &str, declared: &BTreeSet<&str>, claimed: &BTreeSet<String>) -> String {
    let taken = |name: &str| declared.contains(name) || claimed.contains(name);
    if !taken(preferred) {
        return preferred.to_string();
    }
    (1..)
        .map(|n| format!("{preferred}_{n}"))
        .find(|candidate| !taken(candidate.as_str()))
        .unwrap_or_else(|| preferred.to_string())
}

fn display_type(node: &ParameterNode) -> String {
    if node.is_tuple() {
        expand_tuple_type(node)
    } else {
        node.ty.clone()
    }
}

/// Rewrite a tuple node's `tuple[...]` type into its literal signature,
/// recursing into nested tuples and keeping the array suffix.
///
/// `tuple[]` with members `uint256 a, address b` → `(uint256 a, address b)[]`.
pub fn expand_tuple_type(node: &ParameterNode) -> String {
    let Some(components) = &node.components else {
        return node.ty.clone();
    };
    let (_, suffix) = split_array_suffix(&node.ty);
    let members = components
        .iter()
        .map(|c| {
            let ty = display_type(c);
            if c.name.is_empty() {
                ty
            } else {
                format!("{ty} {}", c.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("({members}){suffix}")
}

/// Stable key for a top-level parameter; unnamed ones get `<kind>_<index>`.
pub fn parameter_name(node: &ParameterNode, index: usize) -> String {
    if !node.name.is_empty() {
        return node.name.clone();
    }
    let kind = if node.is_tuple() {
        "tuple"
    } else {
        base_type(&node.ty)
    };
    format!("{kind}_{index}")
}
