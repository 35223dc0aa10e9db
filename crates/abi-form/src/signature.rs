use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::abi::{canonical_params, normalize_type_alias, selector_from_signature, ParamType};
use crate::error::SignatureError;
use crate::type_signature::{matching_paren, parse_type_signature, split_array_suffix, Field};

/// Leading keywords recognized on a human-readable signature.
pub const SIGNATURE_KEYWORDS: &[&str] = &[
    "function",
    "event",
    "error",
    "constructor",
    "fallback",
    "receive",
];

const DATA_LOCATIONS: &[&str] = &["memory", "storage", "calldata"];

const FUNCTION_MODIFIERS: &[&str] = &[
    "external",
    "public",
    "internal",
    "private",
    "view",
    "pure",
    "payable",
    "nonpayable",
    "virtual",
    "override",
];

/// One node of a function's parameter tree.
///
/// `components` is present iff `ty` is `tuple`, `tuple[]`, `tuple[N]`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterNode {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ParameterNode>>,
}

impl ParameterNode {
    pub fn leaf(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            components: None,
        }
    }

    pub fn tuple(
        array_suffix: &str,
        name: impl Into<String>,
        components: Vec<ParameterNode>,
    ) -> Self {
        Self {
            ty: format!("tuple{array_suffix}"),
            name: name.into(),
            components: Some(components),
        }
    }

    pub fn is_tuple(&self) -> bool {
        self.components.is_some()
    }

    /// ABI type of this node, recursing into tuple components.
    pub fn param_type(&self) -> Result<ParamType, SignatureError> {
        let Some(components) = &self.components else {
            return ParamType::parse(&self.ty)
                .map_err(|e| SignatureError::Invalid(e.to_string()));
        };

        let (base, suffix) = split_array_suffix(&self.ty);
        if base != "tuple" {
            return Err(SignatureError::Invalid(format!(
                "components given for non-tuple type: {}",
                self.ty
            )));
        }
        let members = components
            .iter()
            .map(ParameterNode::param_type)
            .collect::<Result<Vec<_>, _>>()?;
        ParamType::Tuple(members)
            .with_array_suffix(suffix)
            .map_err(|e| SignatureError::Invalid(e.to_string()))
    }
}

/// A parsed function: name, parameter trees, and its canonical selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub inputs: Vec<ParameterNode>,
    #[serde(default)]
    pub outputs: Vec<ParameterNode>,
    #[serde(rename = "stateMutability")]
    pub state_mutability: String,
    pub canonical: String,
    pub selector: [u8; 4],
}

impl FunctionDescriptor {
    /// Build a descriptor, checking every parameter type and computing the selector.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<ParameterNode>,
        outputs: Vec<ParameterNode>,
        state_mutability: impl Into<String>,
    ) -> Result<Self, SignatureError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(SignatureError::Invalid(format!(
                "invalid function name: '{name}'"
            )));
        }

        let input_types = inputs
            .iter()
            .map(ParameterNode::param_type)
            .collect::<Result<Vec<_>, _>>()?;
        for output in &outputs {
            output.param_type()?;
        }

        let canonical = format!("{}({})", name, canonical_params(&input_types));
        let selector = selector_from_signature(&canonical);

        Ok(Self {
            name,
            inputs,
            outputs,
            state_mutability: state_mutability.into(),
            canonical,
            selector,
        })
    }

    /// ABI types of the inputs, in declaration order.
    pub fn input_types(&self) -> Result<Vec<ParamType>, SignatureError> {
        self.inputs.iter().map(ParameterNode::param_type).collect()
    }
}

/// JSON ABI fragment, as emitted by solc.
#[derive(Debug, Deserialize)]
struct JsonFragment {
    #[serde(rename = "type", default = "default_fragment_kind")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<ParameterNode>,
    #[serde(default)]
    outputs: Vec<ParameterNode>,
    #[serde(rename = "stateMutability", default = "default_state_mutability")]
    state_mutability: String,
}

fn default_fragment_kind() -> String {
    "function".to_string()
}

fn default_state_mutability() -> String {
    "nonpayable".to_string()
}

/// Interpret a function signature.
///
/// Accepts a human-readable signature (`function transfer(address to, uint256 amount)`,
/// the `function` keyword being optional) or a JSON ABI function fragment.
pub fn parse_function(text: &str) -> Result<FunctionDescriptor, SignatureError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SignatureError::Empty);
    }

    let result = if text.starts_with('{') {
        parse_json_fragment(text)
    } else {
        parse_human_readable(text)
    };

    if let Err(ref err) = result {
        debug!(signature = text, %err, "signature rejected");
    }
    result
}

fn parse_json_fragment(text: &str) -> Result<FunctionDescriptor, SignatureError> {
    let fragment: JsonFragment =
        serde_json::from_str(text).map_err(|e| SignatureError::Invalid(e.to_string()))?;
    if fragment.kind != "function" {
        return Err(SignatureError::NotAFunction(fragment.kind));
    }
    FunctionDescriptor::new(
        fragment.name,
        fragment.inputs,
        fragment.outputs,
        fragment.state_mutability,
    )
}

fn parse_human_readable(text: &str) -> Result<FunctionDescriptor, SignatureError> {
    let keyword_end = text
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(text.len());
    let keyword = &text[..keyword_end];

    let body = match keyword {
        "function" => text[keyword_end..].trim_start(),
        k if SIGNATURE_KEYWORDS.contains(&k) => {
            return Err(SignatureError::NotAFunction(k.to_string()));
        }
        _ => text,
    };

    let open = body
        .find('(')
        .ok_or_else(|| SignatureError::Invalid(format!("missing '(' in: {text}")))?;
    let name = body[..open].trim();
    let close = matching_paren(&body[open..])
        .map(|i| open + i)
        .ok_or_else(|| SignatureError::Invalid(format!("missing ')' in: {text}")))?;

    let inputs = parse_parameters(&body[open..=close])?;
    let (outputs, state_mutability) = parse_trailer(&body[close + 1..])?;

    FunctionDescriptor::new(name, inputs, outputs, state_mutability)
}

/// Parse modifiers and an optional `returns (...)` clause after the parameter list.
fn parse_trailer(trailer: &str) -> Result<(Vec<ParameterNode>, String), SignatureError> {
    let mut outputs = Vec::new();
    let mut state_mutability = default_state_mutability();
    let mut rest = trailer.trim();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("returns") {
            let after = after.trim_start();
            if !after.starts_with('(') {
                return Err(SignatureError::Invalid(
                    "expected '(' after returns".to_string(),
                ));
            }
            let close = matching_paren(after).ok_or_else(|| {
                SignatureError::Invalid("unbalanced returns clause".to_string())
            })?;
            outputs = parse_parameters(&after[..=close])?;
            rest = after[close + 1..].trim_start();
            continue;
        }

        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = &rest[..word_end];
        if !FUNCTION_MODIFIERS.contains(&word) {
            return Err(SignatureError::Invalid(format!("unexpected token: {word}")));
        }
        if matches!(word, "view" | "pure" | "payable" | "nonpayable") {
            state_mutability = word.to_string();
        }
        rest = rest[word_end..].trim_start();
    }

    Ok((outputs, state_mutability))
}

fn parse_parameters(list: &str) -> Result<Vec<ParameterNode>, SignatureError> {
    let inner = list
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(list);
    let fields = parse_type_signature(list);

    // parse_type_signature drops empty items; a non-empty list with no fields is garbage.
    if fields.is_empty() && !inner.trim().is_empty() {
        return Err(SignatureError::Invalid(format!("invalid parameter list: {list}")));
    }

    fields.iter().map(field_to_node).collect()
}

/// Convert a parsed `type name` field into a parameter node.
fn field_to_node(field: &Field) -> Result<ParameterNode, SignatureError> {
    let name = clean_name(&field.name);
    let ty = strip_data_location(&field.ty);
    if ty.is_empty() {
        return Err(SignatureError::Invalid("missing parameter type".to_string()));
    }

    let (base, suffix) = split_array_suffix(&ty);
    let tuple_body = if base.starts_with('(') {
        Some(base)
    } else {
        base.strip_prefix("tuple").filter(|b| b.trim_start().starts_with('('))
    };

    if let Some(body) = tuple_body {
        let components = parse_parameters(body.trim())?;
        return Ok(ParameterNode::tuple(suffix, name, components));
    }

    let ty = normalize_type_alias(&ty);
    ParamType::parse(&ty).map_err(|e| SignatureError::Invalid(e.to_string()))?;
    Ok(ParameterNode::leaf(ty, name))
}

fn strip_data_location(ty: &str) -> String {
    if ty.trim_start().starts_with('(') {
        return ty.trim().to_string();
    }
    ty.split_whitespace()
        .filter(|w| !DATA_LOCATIONS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop qualifier words that trail a tuple type (`(uint256 a) memory data`).
fn clean_name(name: &str) -> String {
    name.split_whitespace()
        .filter(|w| !DATA_LOCATIONS.contains(w))
        .last()
        .unwrap_or_default()
        .to_string()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
