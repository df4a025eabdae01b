pub mod annotation;
pub mod builder;
pub mod component;
pub mod context;
pub mod datatype;
pub mod diagnostic;
pub mod error;
pub mod location;
pub mod name_class;
pub mod pattern;
pub mod source;

pub use annotation::{
    Annotated, AnnotatedNode, AnnotationChild, Annotations, AttributeAnnotation, Comment,
    ElementAnnotation, ElementAnnotationBuilder, TextAnnotation,
};
pub use builder::{
    parse, DataPatternBuilder, GrammarSection, SchemaBuilder, SchemaCollection,
};
pub use component::{
    effective_define, Combine, Component, DefineComponent, DivComponent, IncludeComponent,
    START_NAME,
};
pub use context::{Context, ValidationContext, INHERIT_NS};
pub use datatype::{
    Datatype, DatatypeBuilder, DatatypeError, DatatypeLibrary, DatatypeLibraryFactory,
};
pub use diagnostic::{keys, Diagnostic, ErrorSink};
pub use error::{BuildError, SchemaError};
pub use location::SourceLocation;
pub use name_class::{NameClass, NameClassKind};
pub use pattern::{DataPattern, Param, Pattern, PatternKind, ValuePattern};
pub use source::SchemaSource;
