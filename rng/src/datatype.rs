//! Contract for external datatype libraries.
//!
//! The builder only orchestrates calls into these traits and converts each
//! failed stage into a diagnostic; the semantics of a datatype (lexical
//! spaces, facets, value comparison) live entirely behind them.

use thiserror::Error;

use crate::context::ValidationContext;

/// Failure reported by a datatype library, optionally with a human-readable
/// detail string that is forwarded as a diagnostic argument.
#[derive(Clone, Debug, Default, Error, PartialEq, Eq)]
#[error("{}", detail.as_deref().unwrap_or("datatype error"))]
pub struct DatatypeError {
    pub detail: Option<String>,
}

impl DatatypeError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }

    pub const fn unspecified() -> Self {
        Self { detail: None }
    }
}

/// Resolves datatype library URIs. Returning `None` means the library is
/// unknown; the builder then produces the pattern unvalidated.
pub trait DatatypeLibraryFactory {
    fn create_datatype_library(&self, uri: &str) -> Option<&dyn DatatypeLibrary>;
}

pub trait DatatypeLibrary {
    /// Starts building a datatype of the named type. Fails when the type is
    /// not part of the library.
    fn create_datatype_builder(&self, type_name: &str)
        -> Result<Box<dyn DatatypeBuilder>, DatatypeError>;
}

pub trait DatatypeBuilder {
    fn add_parameter(
        &mut self,
        name: &str,
        value: &str,
        context: &dyn ValidationContext,
    ) -> Result<(), DatatypeError>;

    /// Finalizes the datatype. Fails when the accumulated parameters are
    /// inconsistent.
    fn into_datatype(self: Box<Self>) -> Result<Box<dyn Datatype>, DatatypeError>;
}

pub trait Datatype: std::fmt::Debug {
    /// Whether validation consults the namespace context (e.g. QName).
    fn is_context_dependent(&self) -> bool {
        false
    }

    fn check_valid(
        &self,
        literal: &str,
        context: &dyn ValidationContext,
    ) -> Result<(), DatatypeError>;
}
