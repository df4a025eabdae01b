//! Datatype libraries every RELAX NG processor carries: the native library
//! (the empty URI) and a subset of the W3C XML Schema datatypes.

pub mod xsd;

use rng_model::context::ValidationContext;
use rng_model::datatype::{
    Datatype, DatatypeBuilder, DatatypeError, DatatypeLibrary, DatatypeLibraryFactory,
};

/// Factory serving the two libraries built into the processor. Any other
/// library URI resolves to `None`.
#[derive(Debug, Default)]
pub struct BuiltinDatatypeLibraryFactory {
    native: NativeDatatypeLibrary,
    xsd: xsd::XsdDatatypeLibrary,
}

impl BuiltinDatatypeLibraryFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatatypeLibraryFactory for BuiltinDatatypeLibraryFactory {
    fn create_datatype_library(&self, uri: &str) -> Option<&dyn DatatypeLibrary> {
        match uri {
            "" => Some(&self.native),
            xsd::XSD_DATATYPES_NAMESPACE => Some(&self.xsd),
            _ => None,
        }
    }
}

/// The native library of the empty URI: `string` and `token`, every literal
/// valid, no parameters.
#[derive(Debug, Default)]
pub struct NativeDatatypeLibrary;

impl DatatypeLibrary for NativeDatatypeLibrary {
    fn create_datatype_builder(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn DatatypeBuilder>, DatatypeError> {
        match type_name {
            "string" | "token" => Ok(Box::new(NativeDatatypeBuilder)),
            _ => Err(DatatypeError::unspecified()),
        }
    }
}

struct NativeDatatypeBuilder;

impl DatatypeBuilder for NativeDatatypeBuilder {
    fn add_parameter(
        &mut self,
        name: &str,
        _value: &str,
        _context: &dyn ValidationContext,
    ) -> Result<(), DatatypeError> {
        Err(DatatypeError::new(format!(
            "parameter {name:?} not allowed"
        )))
    }

    fn into_datatype(self: Box<Self>) -> Result<Box<dyn Datatype>, DatatypeError> {
        Ok(Box::new(NativeDatatype))
    }
}

#[derive(Debug)]
struct NativeDatatype;

impl Datatype for NativeDatatype {
    fn check_valid(
        &self,
        _literal: &str,
        _context: &dyn ValidationContext,
    ) -> Result<(), DatatypeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rng_model::context::Context;

    #[test]
    fn native_library_accepts_any_literal() {
        let factory = BuiltinDatatypeLibraryFactory::new();
        let library = factory.create_datatype_library("").unwrap();
        let datatype = library
            .create_datatype_builder("token")
            .unwrap()
            .into_datatype()
            .unwrap();
        assert!(datatype.check_valid("  anything\tat all  ", &Context::default()).is_ok());
    }

    #[test]
    fn native_library_rejects_parameters() {
        let factory = BuiltinDatatypeLibraryFactory::new();
        let library = factory.create_datatype_library("").unwrap();
        let mut builder = library.create_datatype_builder("string").unwrap();
        let error = builder
            .add_parameter("length", "3", &Context::default())
            .unwrap_err();
        assert!(error.detail.unwrap().contains("length"));
    }

    #[test]
    fn unknown_library_uris_are_not_served() {
        let factory = BuiltinDatatypeLibraryFactory::new();
        assert!(factory
            .create_datatype_library("http://example.com/types")
            .is_none());
    }

    #[test]
    fn unknown_native_type_is_refused() {
        let factory = BuiltinDatatypeLibraryFactory::new();
        let library = factory.create_datatype_library("").unwrap();
        assert!(library.create_datatype_builder("decimal").is_err());
    }
}
