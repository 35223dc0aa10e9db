pub mod abi;
pub mod assembler;
pub mod config;
pub mod encoder;
pub mod error;
pub mod form;
pub mod linearize;
pub mod preview;
pub mod signature;
pub mod type_signature;
pub mod validate;
pub mod value;

use error::Error;

// Re-exports for convenience
pub use assembler::{build_calldata, parse_value_preview, Literal};
pub use config::FormConfig;
pub use encoder::{AbiEncoder, CallEncoder};
pub use form::{FormState, LivePreview, ParamValidity};
pub use linearize::{linearize, LinearizedParameter};
pub use preview::{format_preview, format_tuple_with_structure, format_value, ParamValues};
pub use signature::{parse_function, FunctionDescriptor, ParameterNode};
pub use type_signature::{parse_type_signature, Field};
pub use validate::validate;
pub use value::FieldValue;

/// Compute the live preview for a signature and a set of raw field values.
///
/// This is the one-shot entry point: it runs the same pipeline as
/// [`FormState`] but reports an unusable signature as an error.
pub fn preview_call(signature: &str, values: &ParamValues) -> Result<LivePreview, Error> {
    let form = FormState::new(signature, FormConfig::default());
    if let Some(err) = form.error() {
        return Err(Error::Signature(err.clone()));
    }
    let form = form.with_values(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(form.preview().clone())
}
