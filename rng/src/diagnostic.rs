//! Recoverable build-time problems, reported through a sink instead of
//! aborting tree construction.

use crate::location::SourceLocation;

/// Message keys used by the builder.
pub mod keys {
    pub const UNKNOWN_DATATYPE: &str = "unknown_datatype";
    pub const UNSUPPORTED_DATATYPE_DETAIL: &str = "unsupported_datatype_detail";
    pub const INVALID_PARAMS: &str = "invalid_params";
    pub const INVALID_PARAMS_DETAIL: &str = "invalid_params_detail";
    pub const INVALID_PARAM: &str = "invalid_param";
    pub const INVALID_PARAM_DETAIL: &str = "invalid_param_detail";
    pub const INVALID_VALUE: &str = "invalid_value";
    pub const INVALID_VALUE_DETAIL: &str = "invalid_value_detail";
}

/// One reported problem: a message key for localization, up to three string
/// arguments, and where it happened. Formatting is the caller's concern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub key: &'static str,
    pub args: Vec<String>,
    pub location: SourceLocation,
}

/// Receives diagnostics as the build progresses. Any diagnostic marks the
/// overall build as incorrect, independent of structural failures.
pub trait ErrorSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl ErrorSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
