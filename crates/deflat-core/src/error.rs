//! Error types for the deobfuscation pipeline.

use deflat_parser::ParseDiagnostic;
use thiserror::Error;

/// Failure of the bounded expression evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unbound name '{0}'")]
    UnboundName(String),
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
    #[error("evaluation exceeded depth {0}")]
    DepthExceeded(u32),
    #[error("value {0} is not an integer")]
    NotInteger(String),
}

#[derive(Debug, Error)]
pub enum DeobError {
    #[error("parse error in {file_name}: {message}")]
    Parse {
        file_name: String,
        message: String,
        diagnostics: Vec<ParseDiagnostic>,
    },

    /// An if-chain on `name` has more than one branch covering several values.
    #[error("multiple default choice for '{name}'")]
    MultipleDefault { name: String },

    /// The dispatcher's cases do not line up with the recorded key values.
    #[error("key - case mismatch for '{key}': {reason}")]
    KeyCaseMismatch { key: String, reason: String },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl DeobError {
    pub(crate) fn key_case_mismatch(key: &str, reason: impl Into<String>) -> Self {
        DeobError::KeyCaseMismatch {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
