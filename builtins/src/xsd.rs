//! Subset of the W3C XML Schema datatypes library, with the facets RELAX NG
//! schemas use most: `pattern`, `length`, `minLength` and `maxLength`.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use rng_model::context::ValidationContext;
use rng_model::datatype::{Datatype, DatatypeBuilder, DatatypeError, DatatypeLibrary};

/// Library URI the XML Schema datatypes are served under.
pub const XSD_DATATYPES_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-datatypes";

lazy_static! {
    static ref BOOLEAN: Regex = Regex::new(r"\A(true|false|1|0)\z").unwrap();
    static ref INTEGER: Regex = Regex::new(r"\A[+-]?[0-9]+\z").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"\A[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)\z").unwrap();
    // Close approximation of the NCName production; the letter and digit
    // classes cover the character ranges schemas use in practice.
    static ref NCNAME: Regex = Regex::new(r"\A[\p{L}_][\p{L}\p{N}._\-]*\z").unwrap();
    static ref LANGUAGE: Regex = Regex::new(r"\A[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*\z").unwrap();
}

#[derive(Debug, Default)]
pub struct XsdDatatypeLibrary;

impl DatatypeLibrary for XsdDatatypeLibrary {
    fn create_datatype_builder(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn DatatypeBuilder>, DatatypeError> {
        match XsdType::by_name(type_name) {
            Some(ty) => Ok(Box::new(XsdDatatypeBuilder {
                ty,
                facets: Facets::default(),
            })),
            None => Err(DatatypeError::new(format!(
                "type {type_name:?} is not supported"
            ))),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum XsdType {
    String,
    Token,
    Boolean,
    Integer,
    Decimal,
    NcName,
    AnyUri,
    Language,
}

impl XsdType {
    fn by_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "token" => Some(Self::Token),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "decimal" => Some(Self::Decimal),
            "NCName" => Some(Self::NcName),
            "anyURI" => Some(Self::AnyUri),
            "language" => Some(Self::Language),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Token => "token",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::NcName => "NCName",
            Self::AnyUri => "anyURI",
            Self::Language => "language",
        }
    }

    /// Whitespace-normalized form the type is checked and measured against.
    /// `string` preserves the literal; every other type collapses.
    fn comparison_space(self, literal: &str) -> Cow<str> {
        match self {
            Self::String => Cow::Borrowed(literal),
            _ => {
                let collapsed = literal.split_whitespace().collect::<Vec<_>>().join(" ");
                Cow::Owned(collapsed)
            }
        }
    }

    fn check_lexical(self, value: &str) -> bool {
        match self {
            Self::String | Self::Token => true,
            Self::Boolean => BOOLEAN.is_match(value),
            Self::Integer => INTEGER.is_match(value),
            Self::Decimal => DECIMAL.is_match(value),
            Self::NcName => NCNAME.is_match(value),
            // Collapsing already removed leading and trailing whitespace;
            // an embedded space means the literal was more than one token.
            Self::AnyUri => !value.contains(' '),
            Self::Language => LANGUAGE.is_match(value),
        }
    }
}

#[derive(Debug, Default)]
struct Facets {
    pattern: Option<Regex>,
    length: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

struct XsdDatatypeBuilder {
    ty: XsdType,
    facets: Facets,
}

fn parse_length(name: &str, value: &str) -> Result<usize, DatatypeError> {
    value
        .trim()
        .parse()
        .map_err(|_| DatatypeError::new(format!("{name} must be a non-negative integer")))
}

impl DatatypeBuilder for XsdDatatypeBuilder {
    fn add_parameter(
        &mut self,
        name: &str,
        value: &str,
        _context: &dyn ValidationContext,
    ) -> Result<(), DatatypeError> {
        match name {
            "pattern" => {
                // The facet must match the whole literal, not a substring.
                let anchored = format!(r"\A(?:{value})\z");
                let regex = Regex::new(&anchored)
                    .map_err(|error| DatatypeError::new(error.to_string()))?;
                self.facets.pattern = Some(regex);
            }
            "length" => self.facets.length = Some(parse_length(name, value)?),
            "minLength" => self.facets.min_length = Some(parse_length(name, value)?),
            "maxLength" => self.facets.max_length = Some(parse_length(name, value)?),
            _ => {
                return Err(DatatypeError::new(format!(
                    "parameter {name:?} not allowed for {}",
                    self.ty.name()
                )))
            }
        }
        Ok(())
    }

    fn into_datatype(self: Box<Self>) -> Result<Box<dyn Datatype>, DatatypeError> {
        if let (Some(min), Some(max)) = (self.facets.min_length, self.facets.max_length) {
            if min > max {
                return Err(DatatypeError::new(format!(
                    "minLength {min} exceeds maxLength {max}"
                )));
            }
        }
        Ok(Box::new(XsdDatatype {
            ty: self.ty,
            facets: self.facets,
        }))
    }
}

#[derive(Debug)]
struct XsdDatatype {
    ty: XsdType,
    facets: Facets,
}

impl Datatype for XsdDatatype {
    fn check_valid(
        &self,
        literal: &str,
        _context: &dyn ValidationContext,
    ) -> Result<(), DatatypeError> {
        let value = self.ty.comparison_space(literal);
        if !self.ty.check_lexical(&value) {
            return Err(DatatypeError::new(format!(
                "{value:?} is not a valid {}",
                self.ty.name()
            )));
        }
        if let Some(pattern) = &self.facets.pattern {
            if !pattern.is_match(&value) {
                return Err(DatatypeError::new(format!(
                    "{value:?} does not match the pattern facet"
                )));
            }
        }
        let chars = value.chars().count();
        if let Some(length) = self.facets.length {
            if chars != length {
                return Err(DatatypeError::new(format!(
                    "length is {chars}, expected {length}"
                )));
            }
        }
        if let Some(min) = self.facets.min_length {
            if chars < min {
                return Err(DatatypeError::new(format!(
                    "length is {chars}, expected at least {min}"
                )));
            }
        }
        if let Some(max) = self.facets.max_length {
            if chars > max {
                return Err(DatatypeError::new(format!(
                    "length is {chars}, expected at most {max}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rng_model::context::Context;

    fn datatype(type_name: &str, params: &[(&str, &str)]) -> Box<dyn Datatype> {
        let mut builder = XsdDatatypeLibrary
            .create_datatype_builder(type_name)
            .unwrap();
        for (name, value) in params {
            builder
                .add_parameter(name, value, &Context::default())
                .unwrap();
        }
        builder.into_datatype().unwrap()
    }

    #[test]
    fn boolean_lexical_space() {
        let boolean = datatype("boolean", &[]);
        let context = Context::default();
        assert!(boolean.check_valid("true", &context).is_ok());
        assert!(boolean.check_valid(" 1 ", &context).is_ok());
        assert!(boolean.check_valid("yes", &context).is_err());
    }

    #[test]
    fn integer_collapses_whitespace_before_checking() {
        let integer = datatype("integer", &[]);
        let context = Context::default();
        assert!(integer.check_valid("\n\t-42  ", &context).is_ok());
        assert!(integer.check_valid("4 2", &context).is_err());
        assert!(integer.check_valid("3.5", &context).is_err());
    }

    #[test]
    fn decimal_accepts_fractions() {
        let decimal = datatype("decimal", &[]);
        let context = Context::default();
        assert!(decimal.check_valid("3.5", &context).is_ok());
        assert!(decimal.check_valid(".5", &context).is_ok());
        assert!(decimal.check_valid("+", &context).is_err());
    }

    #[test]
    fn ncname_rejects_colons() {
        let ncname = datatype("NCName", &[]);
        let context = Context::default();
        assert!(ncname.check_valid("local-name", &context).is_ok());
        assert!(ncname.check_valid("prefix:local", &context).is_err());
        assert!(ncname.check_valid("1starts-with-digit", &context).is_err());
    }

    #[test]
    fn language_tags() {
        let language = datatype("language", &[]);
        let context = Context::default();
        assert!(language.check_valid("en", &context).is_ok());
        assert!(language.check_valid("en-US", &context).is_ok());
        assert!(language.check_valid("english-language-tag", &context).is_err());
    }

    #[test]
    fn any_uri_is_a_single_token() {
        let uri = datatype("anyURI", &[]);
        let context = Context::default();
        assert!(uri.check_valid(" http://example.com/a ", &context).is_ok());
        assert!(uri.check_valid("two tokens", &context).is_err());
    }

    #[test]
    fn pattern_facet_matches_the_whole_literal() {
        let token = datatype("token", &[("pattern", "[a-z]+")]);
        let context = Context::default();
        assert!(token.check_valid("abc", &context).is_ok());
        assert!(token.check_valid("abc1", &context).is_err());
    }

    #[test]
    fn length_facets_measure_the_collapsed_value() {
        let token = datatype("token", &[("minLength", "2"), ("maxLength", "3")]);
        let context = Context::default();
        assert!(token.check_valid("  ab ", &context).is_ok());
        assert!(token.check_valid("a", &context).is_err());
        assert!(token.check_valid("abcd", &context).is_err());
    }

    #[test]
    fn malformed_pattern_fails_the_parameter_stage() {
        let mut builder = XsdDatatypeLibrary.create_datatype_builder("token").unwrap();
        assert!(builder
            .add_parameter("pattern", "[unclosed", &Context::default())
            .is_err());
    }

    #[test]
    fn unknown_parameter_is_refused() {
        let mut builder = XsdDatatypeLibrary
            .create_datatype_builder("integer")
            .unwrap();
        let error = builder
            .add_parameter("totalDigits", "3", &Context::default())
            .unwrap_err();
        assert!(error.detail.unwrap().contains("totalDigits"));
    }

    #[test]
    fn inconsistent_length_bounds_fail_at_finish() {
        let mut builder = XsdDatatypeLibrary.create_datatype_builder("token").unwrap();
        builder
            .add_parameter("minLength", "5", &Context::default())
            .unwrap();
        builder
            .add_parameter("maxLength", "2", &Context::default())
            .unwrap();
        let error = builder.into_datatype().unwrap_err();
        assert!(error.detail.unwrap().contains("minLength"));
    }

    #[test]
    fn unsupported_type_is_refused() {
        assert!(XsdDatatypeLibrary.create_datatype_builder("dateTime").is_err());
    }
}
