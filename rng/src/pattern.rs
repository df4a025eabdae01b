//! The RELAX NG content-model tree.

use std::collections::BTreeMap;

use crate::annotation::{Annotated, AnnotatedNode};
use crate::component::Component;
use crate::name_class::NameClass;

/// A node in the content-model tree, combining the structural variant with
/// the metadata every node carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub annotated: Annotated,
    pub kind: PatternKind,
}

impl Pattern {
    pub(crate) fn new(kind: PatternKind) -> Self {
        Self {
            annotated: Annotated::default(),
            kind,
        }
    }
}

impl AnnotatedNode for Pattern {
    fn annotated(&self) -> &Annotated {
        &self.annotated
    }

    fn annotated_mut(&mut self) -> &mut Annotated {
        &mut self.annotated
    }

    // <value> is the only pattern whose serialized form holds character data.
    fn may_contain_text(&self) -> bool {
        matches!(self.kind, PatternKind::Value(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternKind {
    Choice(Vec<Pattern>),
    Group(Vec<Pattern>),
    Interleave(Vec<Pattern>),
    OneOrMore(Box<Pattern>),
    ZeroOrMore(Box<Pattern>),
    Optional(Box<Pattern>),
    List(Box<Pattern>),
    Mixed(Box<Pattern>),
    Empty,
    NotAllowed,
    Text,
    Attribute {
        name_class: NameClass,
        pattern: Box<Pattern>,
    },
    Element {
        name_class: NameClass,
        pattern: Box<Pattern>,
    },
    Value(ValuePattern),
    Data(DataPattern),
    /// Reference to a definition of the nearest enclosing grammar.
    Ref(String),
    /// Reference to a definition of the parent grammar.
    ParentRef(String),
    ExternalRef {
        href: String,
        /// Namespace inherited by the referenced document; [`INHERIT_NS`]
        /// when not written out.
        ///
        /// [`INHERIT_NS`]: crate::context::INHERIT_NS
        ns: String,
    },
    Grammar(Vec<Component>),
}

/// A typed literal (`<value>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuePattern {
    pub datatype_library: String,
    pub type_name: String,
    pub value: String,
    /// Prefix resolutions recorded while validating the literal against a
    /// context-dependent datatype, so consumers of the finished tree do not
    /// need the live namespace context.
    pub prefix_map: BTreeMap<String, String>,
}

impl ValuePattern {
    pub fn new(
        datatype_library: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            datatype_library: datatype_library.into(),
            type_name: type_name.into(),
            value: value.into(),
            prefix_map: BTreeMap::new(),
        }
    }
}

/// A parameterized datatype (`<data>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataPattern {
    pub datatype_library: String,
    pub type_name: String,
    pub params: Vec<Param>,
    pub except: Option<Box<Pattern>>,
}

/// A datatype parameter declaration. Kept on the [`DataPattern`] verbatim
/// even when the datatype library rejects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub annotated: Annotated,
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            annotated: Annotated::default(),
            name: name.into(),
            value: value.into(),
        }
    }
}

impl AnnotatedNode for Param {
    fn annotated(&self) -> &Annotated {
        &self.annotated
    }

    fn annotated_mut(&mut self) -> &mut Annotated {
        &mut self.annotated
    }

    fn may_contain_text(&self) -> bool {
        true
    }
}
