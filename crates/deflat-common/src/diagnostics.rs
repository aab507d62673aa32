//! Diagnostics reported by the deobfuscation passes.
//!
//! Passes never fail a whole run for a structural surprise; they record an
//! advisory `Diagnostic` and leave the affected subtree as it was. Every
//! diagnostic is also logged through `tracing` at the site that creates it.

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// A diagnostic record collected into the run output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    /// Build a diagnostic from a message template and its `{n}` arguments.
    pub fn from_message(message: &DiagnosticMessage, start: u32, length: u32, args: &[&str]) -> Self {
        Self {
            category: message.category,
            code: message.code,
            start,
            length,
            message_text: format_message(message.message, args),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

pub mod diagnostic_codes {
    pub const PARSE_ERROR: u32 = 1000;
    pub const UNEXPECTED_PARENT_TYPE: u32 = 2001;
    pub const INLINE_SKIPPED: u32 = 2002;
    pub const UNEXPECTED_LOOP_BODY: u32 = 3001;
    pub const DISPATCH_VARIABLE: u32 = 3002;
    pub const DISPATCH_KEY: u32 = 3003;
    pub const MULTIPLE_DEFAULT_CHOICE: u32 = 4001;
    pub const UNREACHABLE_BRANCH: u32 = 4002;
    pub const ESCAPING_BREAK: u32 = 4003;
    pub const OPAQUE_KEY: u32 = 5001;
    pub const KEY_SIZE: u32 = 5002;
    pub const KEY_CASE_MISMATCH: u32 = 6001;
    pub const DROP_IN_KEY: u32 = 6002;
    pub const MERGE_LIMIT: u32 = 6003;
    pub const LOOP_COLLAPSED: u32 = 6004;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const PARSE_ERROR: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::PARSE_ERROR,
        category: DiagnosticCategory::Error,
        message: "{0}",
    };
    pub const UNEXPECTED_PARENT_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNEXPECTED_PARENT_TYPE,
        category: DiagnosticCategory::Warning,
        message: "Unexpected parent type '{0}' for {1}; left unchanged.",
    };
    pub const INLINE_SKIPPED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::INLINE_SKIPPED,
        category: DiagnosticCategory::Message,
        message: "Immediately invoked function not inlined: {0}.",
    };
    pub const UNEXPECTED_LOOP_BODY: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNEXPECTED_LOOP_BODY,
        category: DiagnosticCategory::Warning,
        message: "Dispatch loop for '{0}' has {1} body statements, expected 2.",
    };
    pub const DISPATCH_VARIABLE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::DISPATCH_VARIABLE,
        category: DiagnosticCategory::Message,
        message: "Dispatch variable '{0}' (range {1}, key '{2}', parent '{3}').",
    };
    pub const DISPATCH_KEY: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::DISPATCH_KEY,
        category: DiagnosticCategory::Message,
        message: "Dispatch key '{0}' starts at {1}.",
    };
    pub const MULTIPLE_DEFAULT_CHOICE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::MULTIPLE_DEFAULT_CHOICE,
        category: DiagnosticCategory::Error,
        message: "Multiple default choice for '{0}'; chain left unchanged.",
    };
    pub const UNREACHABLE_BRANCH: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNREACHABLE_BRANCH,
        category: DiagnosticCategory::Warning,
        message: "Branch on '{0}' is unreachable and was dropped.",
    };
    pub const ESCAPING_BREAK: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::ESCAPING_BREAK,
        category: DiagnosticCategory::Warning,
        message: "Chain on '{0}' contains a break that would change target; left unchanged.",
    };
    pub const OPAQUE_KEY: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::OPAQUE_KEY,
        category: DiagnosticCategory::Warning,
        message: "Dispatch key '{0}' is not tracked: {1}.",
    };
    pub const KEY_SIZE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::KEY_SIZE,
        category: DiagnosticCategory::Message,
        message: "Dispatch key '{0}' has {1} states.",
    };
    pub const KEY_CASE_MISMATCH: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::KEY_CASE_MISMATCH,
        category: DiagnosticCategory::Error,
        message: "Key - Case miss match for '{0}': {1}.",
    };
    pub const DROP_IN_KEY: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::DROP_IN_KEY,
        category: DiagnosticCategory::Warning,
        message: "Drop in key '{0}': case {1} is never selected.",
    };
    pub const MERGE_LIMIT: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::MERGE_LIMIT,
        category: DiagnosticCategory::Warning,
        message: "Merging '{0}' stopped after {1} sweeps.",
    };
    pub const LOOP_COLLAPSED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::LOOP_COLLAPSED,
        category: DiagnosticCategory::Message,
        message: "Dispatch loop for '{0}' collapsed into straight-line code.",
    };
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_substitutes_in_order() {
        assert_eq!(format_message("{0} and {1}", &["a", "b"]), "a and b");
        assert_eq!(format_message("no args", &[]), "no args");
    }

    #[test]
    fn from_message_keeps_code_and_category() {
        let diag = Diagnostic::from_message(&diagnostic_messages::DROP_IN_KEY, 4, 2, &["k", "7"]);
        assert_eq!(diag.code, diagnostic_codes::DROP_IN_KEY);
        assert_eq!(diag.category, DiagnosticCategory::Warning);
        assert_eq!(diag.message_text, "Drop in key 'k': case 7 is never selected.");
        assert!(!diag.is_error());
    }
}
