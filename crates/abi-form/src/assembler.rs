use std::fmt;

use num_bigint::BigInt;
use tracing::debug;

use crate::encoder::{AbiEncoder, CallEncoder};
use crate::error::{AssembleError, Error};
use crate::preview::quote_string;
use crate::signature::{parse_function, FunctionDescriptor, SIGNATURE_KEYWORDS};
use crate::validate::parse_integer;

/// Keyword prepended to signatures that carry none.
pub const DEFAULT_KEYWORD: &str = "function";

/// One argument literal recovered from a value preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Tuple(Vec<Literal>),
    Array(Vec<Literal>),
    Str(String),
    /// `0x` followed by exactly 40 hex characters.
    Address(String),
    Bool(bool),
    Integer(BigInt),
    Decimal(String),
    /// Any other `0x`-prefixed hex literal.
    Hex(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Tuple(items) => write!(f, "({})", join(items)),
            Literal::Array(items) => write!(f, "[{}]", join(items)),
            Literal::Str(s) => f.write_str(&quote_string(s)),
            Literal::Address(s) | Literal::Decimal(s) | Literal::Hex(s) => f.write_str(s),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Integer(n) => write!(f, "{n}"),
        }
    }
}

fn join(items: &[Literal]) -> String {
    items
        .iter()
        .map(Literal::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Make sure a signature starts with a recognized keyword, prepending `keyword` if not.
pub fn normalize_signature(signature: &str, keyword: &str) -> String {
    let trimmed = signature.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let first = trimmed
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    if SIGNATURE_KEYWORDS.contains(&first) || trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        format!("{keyword} {trimmed}")
    }
}

/// Tokenize a value preview (`"0x12", (1, (2, 3)), [4, 5]`) into argument literals.
pub fn parse_value_preview(preview: &str) -> Result<Vec<Literal>, AssembleError> {
    let preview = preview.trim();
    if preview.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(preview)?
        .into_iter()
        .map(parse_literal)
        .collect()
}

/// Split on commas outside of quotes, parentheses and brackets.
fn split_top_level(s: &str) -> Result<Vec<&str>, AssembleError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| AssembleError::Unbalanced(s.to_string()))?;
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_string {
        return Err(AssembleError::UnterminatedString(s.to_string()));
    }
    if depth != 0 {
        return Err(AssembleError::Unbalanced(s.to_string()));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn parse_literal(raw: &str) -> Result<Literal, AssembleError> {
    let s = raw.trim();

    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return parse_sequence(inner).map(Literal::Tuple);
    }
    if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return parse_sequence(inner).map(Literal::Array);
    }
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        return unquote(&s[1..s.len() - 1])
            .map(Literal::Str)
            .ok_or_else(|| AssembleError::UnrecognizedLiteral(s.to_string()));
    }

    match s {
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        _ => {}
    }

    if let Some(digits) = s.strip_prefix("0x") {
        if digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(if digits.len() == 40 {
                Literal::Address(s.to_string())
            } else {
                Literal::Hex(s.to_string())
            });
        }
    }

    if s.contains('.') {
        let unsigned = s.strip_prefix('-').unwrap_or(s);
        let mut halves = unsigned.splitn(2, '.');
        let whole = halves.next().unwrap_or_default();
        let frac = halves.next().unwrap_or_default();
        if !(whole.is_empty() && frac.is_empty())
            && whole.chars().all(|c| c.is_ascii_digit())
            && frac.chars().all(|c| c.is_ascii_digit())
        {
            return Ok(Literal::Decimal(s.to_string()));
        }
        return Err(AssembleError::UnrecognizedLiteral(s.to_string()));
    }

    parse_integer(s, "number")
        .map(Literal::Integer)
        .map_err(|_| AssembleError::UnrecognizedLiteral(s.to_string()))
}

/// Undo `quote_string`; a bare `"` inside the body is not one string.
fn unquote(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

fn parse_sequence(inner: &str) -> Result<Vec<Literal>, AssembleError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(inner)?
        .into_iter()
        .map(parse_literal)
        .collect()
}

/// Encode a value preview against an already-parsed function.
pub fn assemble_call(
    encoder: &dyn CallEncoder,
    descriptor: &FunctionDescriptor,
    value_preview: &str,
) -> Result<Vec<u8>, Error> {
    let args = parse_value_preview(value_preview)?;
    encoder.encode_call(descriptor, &args).map_err(|err| {
        debug!(function = %descriptor.canonical, %err, "encoding failed");
        Error::Encode(err)
    })
}

/// Build calldata for `signature` from its value preview using the given encoder.
pub fn build_calldata_with(
    encoder: &dyn CallEncoder,
    signature: &str,
    value_preview: &str,
) -> Result<Vec<u8>, Error> {
    let descriptor = parse_function(&normalize_signature(signature, DEFAULT_KEYWORD))?;
    assemble_call(encoder, &descriptor, value_preview)
}

/// Build calldata for `signature` from its value preview with the standard ABI encoder.
pub fn build_calldata(signature: &str, value_preview: &str) -> Result<Vec<u8>, Error> {
    build_calldata_with(&AbiEncoder, signature, value_preview)
}
