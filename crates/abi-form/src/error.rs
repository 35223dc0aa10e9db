use thiserror::Error;

/// Unified error type for the abi-form library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("assemble error: {0}")]
    Assemble(#[from] AssembleError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("config error: {0}")]
    Config(String),
}

/// Errors while interpreting a function signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("ABI cannot be empty")]
    Empty,

    #[error("signature must describe a function, found {0}")]
    NotAFunction(String),

    #[error("invalid function signature: {0}")]
    Invalid(String),
}

/// Per-field validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Value cannot be empty")]
    Empty,

    #[error("Invalid {ty} value: {value}")]
    NotANumber { ty: String, value: String },

    #[error("Value exceeds maximum for {0}")]
    AboveMaximum(String),

    #[error("Value is below minimum for {0}")]
    BelowMinimum(String),

    #[error("Value must be true or false")]
    InvalidBool,

    #[error("Invalid address: expected 0x followed by 40 hex characters")]
    InvalidAddress,

    #[error("Invalid bytes: expected 0x followed by hex characters")]
    InvalidBytes,

    #[error("Invalid {ty}: expected 0x followed by {hex_len} hex characters")]
    InvalidFixedBytes { ty: String, hex_len: usize },

    #[error("Invalid array value for {0}")]
    InvalidArray(String),

    #[error("Expected {expected} items for {ty}, got {actual}")]
    ArrayLength {
        ty: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid tuple value for {0}")]
    InvalidTuple(String),

    #[error("Expected a single value for {0}")]
    UnexpectedComposite(String),

    #[error("Field {field}: {source}")]
    Member {
        field: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
}

/// Errors while turning a value preview into a literal argument list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("unbalanced delimiters in: {0}")]
    Unbalanced(String),

    #[error("unterminated string literal: {0}")]
    UnterminatedString(String),

    #[error("unrecognized literal: {0}")]
    UnrecognizedLiteral(String),
}

/// Errors during ABI encoding of a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("expected {expected} arguments, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("cannot encode {value} as {ty}")]
    TypeMismatch { ty: String, value: String },

    #[error("value {value} out of range for {ty}")]
    OutOfRange { ty: String, value: String },

    #[error("invalid ABI type: {0}")]
    InvalidType(String),
}

/// Internal formatting inconsistency; recovered by the preview fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("value is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("value is not a JSON array: {0}")]
    NotAnArray(String),

    #[error("type is not a tuple signature: {0}")]
    NotATuple(String),
}
