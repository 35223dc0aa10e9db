use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::abi::to_hex_prefixed;
use crate::assembler::{assemble_call, normalize_signature};
use crate::config::FormConfig;
use crate::encoder::{AbiEncoder, CallEncoder};
use crate::error::{SignatureError, ValidationError};
use crate::linearize::{linearize, LinearizedParameter};
use crate::preview::{format_preview, ParamValues};
use crate::signature::{parse_function, FunctionDescriptor};
use crate::validate::{is_valid_by_default, validate_wire};

/// Per-field validity, keyed like [`ParamValues`].
pub type ParamValidity = BTreeMap<String, bool>;

/// What the host shows for the current revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePreview {
    pub function_signature: String,
    pub value_preview: String,
    /// `0x`-prefixed calldata, empty when none could be built.
    pub bytecode: String,
    pub is_valid: bool,
}

/// One immutable revision of a call form.
///
/// Every edit returns a new revision with all derived state (validity,
/// preview, calldata) recomputed from the signature and values.
#[derive(Debug, Clone)]
pub struct FormState<E = AbiEncoder> {
    config: FormConfig,
    encoder: E,
    signature: String,
    descriptor: Option<FunctionDescriptor>,
    error: Option<SignatureError>,
    parameters: Vec<LinearizedParameter>,
    values: ParamValues,
    validity: ParamValidity,
    field_errors: BTreeMap<String, ValidationError>,
    preview: LivePreview,
    updated_at: Option<Instant>,
}

impl FormState<AbiEncoder> {
    pub fn new(signature: &str, config: FormConfig) -> Self {
        Self::with_encoder(signature, config, AbiEncoder)
    }
}

impl<E: CallEncoder + Clone> FormState<E> {
    /// Start a form for `signature`, encoding calls with `encoder`.
    pub fn with_encoder(signature: &str, config: FormConfig, encoder: E) -> Self {
        let normalized = normalize_signature(signature, &config.default_keyword);
        let mut state = Self {
            config,
            encoder,
            signature: signature.to_string(),
            descriptor: None,
            error: None,
            parameters: Vec::new(),
            values: ParamValues::new(),
            validity: ParamValidity::new(),
            field_errors: BTreeMap::new(),
            preview: LivePreview::default(),
            updated_at: None,
        };

        match parse_function(&normalized) {
            Ok(descriptor) => {
                state.parameters = linearize(&descriptor);
                for param in &state.parameters {
                    state.values.insert(param.name.clone(), String::new());
                    state
                        .validity
                        .insert(param.name.clone(), is_valid_by_default(&param.ty));
                }
                state.descriptor = Some(descriptor);
                state.refresh()
            }
            Err(err) => {
                debug!(%err, "form has no usable signature");
                state.error = Some(err);
                state
            }
        }
    }

    /// A fresh form for a new signature; nothing carries over but config and encoder.
    pub fn with_signature(&self, signature: &str) -> Self {
        Self::with_encoder(signature, self.config.clone(), self.encoder.clone())
    }

    /// The next revision after the user edits field `name`.
    ///
    /// Names that are not top-level parameters leave the form unchanged.
    pub fn with_value(&self, name: &str, value: &str) -> Self {
        let Some(param) = self.parameters.iter().find(|p| p.name == name) else {
            debug!(field = name, "ignoring edit of unknown field");
            return self.clone();
        };
        let ty = param.ty.clone();

        let mut next = self.clone();
        next.values.insert(name.to_string(), value.to_string());

        let outcome = if value.is_empty() && is_valid_by_default(&ty) {
            Ok(())
        } else {
            validate_wire(value, &ty)
        };
        match outcome {
            Ok(()) => {
                next.validity.insert(name.to_string(), true);
                next.field_errors.remove(name);
            }
            Err(err) => {
                trace!(field = name, %err, "field invalid");
                next.validity.insert(name.to_string(), false);
                next.field_errors.insert(name.to_string(), err);
            }
        }

        next.updated_at = Some(Instant::now());
        next.refresh()
    }

    /// Apply several edits in order.
    pub fn with_values<'a, I>(&self, edits: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        edits
            .into_iter()
            .fold(self.clone(), |state, (name, value)| state.with_value(name, value))
    }

    /// Recompute the preview and calldata from the current values.
    fn refresh(mut self) -> Self {
        let Some(descriptor) = &self.descriptor else {
            return self;
        };

        let value_preview = format_preview(&self.parameters, &self.values);
        let fields_valid = self.validity.values().all(|valid| *valid);

        let bytecode = if fields_valid {
            match assemble_call(&self.encoder, descriptor, &value_preview) {
                Ok(calldata) => to_hex_prefixed(&calldata),
                Err(err) => {
                    debug!(%err, "no calldata for this revision");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        self.preview = LivePreview {
            function_signature: descriptor.canonical.clone(),
            value_preview,
            is_valid: fields_valid && !bytecode.is_empty(),
            bytecode,
        };
        self
    }

    /// Whether the last edit happened within the configured window before `now`.
    pub fn is_recently_updated(&self, now: Instant) -> bool {
        self.updated_at.is_some_and(|at| {
            now.saturating_duration_since(at) < self.config.recent_update_window()
        })
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn descriptor(&self) -> Option<&FunctionDescriptor> {
        self.descriptor.as_ref()
    }

    /// Why the signature could not be used, if it could not.
    pub fn error(&self) -> Option<&SignatureError> {
        self.error.as_ref()
    }

    pub fn parameters(&self) -> &[LinearizedParameter] {
        &self.parameters
    }

    /// Raw per-field values, for the host to keep.
    pub fn values(&self) -> &ParamValues {
        &self.values
    }

    pub fn validity(&self) -> &ParamValidity {
        &self.validity
    }

    pub fn field_error(&self, name: &str) -> Option<&ValidationError> {
        self.field_errors.get(name)
    }

    pub fn preview(&self) -> &LivePreview {
        &self.preview
    }

    pub fn is_valid(&self) -> bool {
        self.preview.is_valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

    #[test]
    fn test_transfer_end_to_end() {
        let form = FormState::new(
            "function transfer(address to, uint256 amount)",
            FormConfig::default(),
        )
        .with_value("to", ZERO_ADDRESS)
        .with_value("amount", "100");

        let preview = form.preview();
        assert_eq!(preview.function_signature, "transfer(address,uint256)");
        assert_eq!(preview.value_preview, format!("{ZERO_ADDRESS}, 100"));
        assert!(preview.is_valid);
        assert!(preview.bytecode.starts_with("0xa9059cbb"));
        assert_eq!(preview.bytecode.len(), 2 + 8 + 128);
        assert!(preview.bytecode.ends_with("64"));
    }

    #[test]
    fn test_fresh_form_initial_state() {
        let form = FormState::new(
            "function f(uint8 a, string s, (bool b) t)",
            FormConfig::default(),
        );
        assert!(form.error().is_none());
        assert_eq!(form.values().len(), 3);
        assert!(form.values().values().all(String::is_empty));
        assert_eq!(form.validity()["a"], false);
        assert_eq!(form.validity()["s"], true);
        assert_eq!(form.validity()["t"], true);
        assert!(!form.is_valid());
        assert_eq!(form.preview().value_preview, r#", "", (...)"#);
        assert!(!form.is_recently_updated(Instant::now()));
    }

    #[test]
    fn test_empty_signature() {
        let form = FormState::new("", FormConfig::default());
        assert_eq!(form.error(), Some(&SignatureError::Empty));
        assert_eq!(form.error().unwrap().to_string(), "ABI cannot be empty");
        assert!(!form.is_valid());
        assert!(form.parameters().is_empty());
        assert_eq!(form.preview(), &LivePreview::default());
    }

    #[test]
    fn test_event_signature_rejected() {
        let form = FormState::new(
            "event Transfer(address indexed from, address indexed to, uint256 value)",
            FormConfig::default(),
        );
        assert!(matches!(form.error(), Some(SignatureError::NotAFunction(_))));
        assert!(form
            .error()
            .unwrap()
            .to_string()
            .contains("must describe a function"));
        assert!(!form.is_valid());
    }

    #[test]
    fn test_invalid_field_blocks_calldata_but_keeps_values() {
        let form = FormState::new("function f(uint8 a, bool b)", FormConfig::default())
            .with_value("a", "256")
            .with_value("b", "true");
        assert_eq!(form.values()["a"], "256");
        assert_eq!(form.validity()["a"], false);
        assert_eq!(form.validity()["b"], true);
        assert_eq!(
            form.field_error("a").unwrap().to_string(),
            "Value exceeds maximum for uint8"
        );
        assert!(!form.is_valid());
        assert!(form.preview().bytecode.is_empty());
        assert_eq!(form.preview().value_preview, "256, true");

        let fixed = form.with_value("a", "255");
        assert!(fixed.field_error("a").is_none());
        assert!(fixed.is_valid());
    }

    #[test]
    fn test_tuple_field_encodes_once_filled() {
        let form = FormState::new(
            "function f(bytes data, (uint256 a, (uint256 b, uint256 c) inner) cfg)",
            FormConfig::default(),
        );
        assert_eq!(form.validity()["cfg"], true);

        let partial = form
            .with_value("data", "0x12")
            .with_value("cfg", r#"{"a":"1"}"#);
        assert_eq!(partial.validity()["cfg"], false);
        assert_eq!(partial.preview().value_preview, "0x12, (1, ...)");
        assert!(!partial.is_valid());

        let full = partial.with_value("cfg", r#"{"a":"1","inner":"{\"b\":\"2\",\"c\":\"3\"}"}"#);
        assert_eq!(full.preview().value_preview, "0x12, (1, (2, 3))");
        assert!(full.is_valid());
        assert!(!full.preview().bytecode.is_empty());
    }

    #[test]
    fn test_revisions_are_immutable() {
        let first = FormState::new("function f(uint8 a)", FormConfig::default());
        let second = first.with_value("a", "1");
        assert_eq!(first.values()["a"], "");
        assert_eq!(second.values()["a"], "1");
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let form = FormState::new("function f(uint8 a)", FormConfig::default());
        let next = form.with_value("zzz", "1");
        assert_eq!(next.values(), form.values());
        assert!(!next.values().contains_key("zzz"));
    }

    #[test]
    fn test_new_signature_replaces_state() {
        let form = FormState::new("function f(uint8 a)", FormConfig::default())
            .with_value("a", "1");
        assert!(form.is_valid());

        let replaced = form.with_signature("function g(bool a, address b)");
        assert_eq!(replaced.values()["a"], "");
        assert_eq!(replaced.validity()["a"], false);
        assert!(!replaced.is_valid());
        assert_eq!(replaced.preview().function_signature, "g(bool,address)");
    }

    #[test]
    fn test_zero_argument_function() {
        let form = FormState::new("pause()", FormConfig::default());
        assert!(form.is_valid());
        assert_eq!(form.preview().value_preview, "");
        assert_eq!(form.preview().bytecode.len(), 2 + 8);
    }

    #[test]
    fn test_recently_updated_window() {
        let config = FormConfig {
            recent_update_ms: 50,
            ..FormConfig::default()
        };
        let form = FormState::new("function f(uint8 a)", config).with_value("a", "1");
        let now = Instant::now();
        assert!(form.is_recently_updated(now));
        assert!(!form.is_recently_updated(now + Duration::from_millis(100)));
    }

    #[test]
    fn test_blank_array_stays_invalid_after_edit() {
        let fresh = FormState::new("function f(uint8[] xs)", FormConfig::default());
        assert_eq!(fresh.validity()["xs"], false);

        let cleared = fresh.with_value("xs", "[1]").with_value("xs", "");
        assert_eq!(cleared.validity()["xs"], false);
        assert_eq!(cleared.field_error("xs"), Some(&ValidationError::Empty));
        assert!(!cleared.is_valid());
        assert!(cleared.preview().bytecode.is_empty());

        let explicit = fresh.with_value("xs", "[]");
        assert!(explicit.is_valid());
        assert!(!explicit.preview().bytecode.is_empty());
    }

    #[test]
    fn test_unnamed_field_does_not_share_a_declared_key() {
        let dead = "0x000000000000000000000000000000000000dEaD";
        let form = FormState::new("function f(address address_1, address)", FormConfig::default());
        let names: Vec<_> = form.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["address_1", "address_1_1"]);
        assert_eq!(form.values().len(), 2);

        let form = form.with_value("address_1", dead);
        assert_eq!(form.preview().value_preview, format!("{dead}, "));
        assert!(!form.is_valid());

        let form = form.with_value("address_1_1", ZERO_ADDRESS);
        assert_eq!(form.preview().value_preview, format!("{dead}, {ZERO_ADDRESS}"));
        assert!(form.is_valid());
    }

    #[test]
    fn test_quoted_strings_encode_as_one_argument() {
        let form = FormState::new("function say(string a, string b)", FormConfig::default())
            .with_values([("a", r#"x", "y"#), ("b", "z")]);
        assert_eq!(form.preview().value_preview, r#""x\", \"y", "z""#);
        assert!(form.is_valid());

        let quoted = form.with_value("a", r#"say "hi"#);
        assert!(quoted.is_valid());
        assert!(!quoted.preview().bytecode.is_empty());
    }

    #[test]
    fn test_with_values_and_live_preview_json() {
        let form = FormState::new("function set(string key, uint256 value)", FormConfig::default())
            .with_values([("key", "a,b"), ("value", "7")]);
        assert!(form.is_valid());
        let json = serde_json::to_value(form.preview()).unwrap();
        assert_eq!(json["valuePreview"], r#""a,b", 7"#);
        assert_eq!(json["functionSignature"], "set(string,uint256)");
        assert_eq!(json["isValid"], true);
    }
}
