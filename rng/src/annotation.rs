//! Annotation and comment metadata carried by every node of the schema tree.
//!
//! Two independent metadata streams (comments and foreign-namespace
//! annotations) are collected alongside the structural construction events
//! and merged onto the node being built exactly once, at finalization.

use crate::context::Context;
use crate::location::SourceLocation;

/// A comment read from the schema document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub value: String,
    pub location: SourceLocation,
}

impl Comment {
    pub fn new(value: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            value: value.into(),
            location,
        }
    }
}

/// Character data inside a foreign annotation element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextAnnotation {
    pub value: String,
    pub location: SourceLocation,
}

/// A foreign-namespace attribute attached to a schema construct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeAnnotation {
    pub namespace_uri: String,
    pub local_name: String,
    pub prefix: Option<String>,
    pub value: String,
    pub location: SourceLocation,
}

/// A foreign-namespace element attached to a schema construct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementAnnotation {
    pub namespace_uri: String,
    pub local_name: String,
    pub prefix: Option<String>,
    pub attributes: Vec<AttributeAnnotation>,
    pub children: Vec<AnnotationChild>,
    pub context: Context,
    pub location: SourceLocation,
}

/// Ordered mixed content of an annotation list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationChild {
    Comment(Comment),
    Element(ElementAnnotation),
    Text(TextAnnotation),
}

/// Metadata base embedded in every pattern, name class, grammar component
/// and datatype parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotated {
    pub location: SourceLocation,
    pub context: Context,
    pub leading_comments: Vec<Comment>,
    pub attribute_annotations: Vec<AttributeAnnotation>,
    pub child_element_annotations: Vec<AnnotationChild>,
    pub following_element_annotations: Vec<AnnotationChild>,
}

impl Annotated {
    /// Looks up the value of an attribute annotation by expanded name.
    pub fn attribute_annotation(&self, namespace_uri: &str, local_name: &str) -> Option<&str> {
        self.attribute_annotations
            .iter()
            .find(|att| att.namespace_uri == namespace_uri && att.local_name == local_name)
            .map(|att| att.value.as_str())
    }
}

/// A tree node carrying [`Annotated`] metadata.
///
/// `may_contain_text` reports whether the node's serialized form can hold
/// character data. For such nodes interior annotation elements are not
/// distinguishable from trailing ones, so finalization routes them into the
/// following list instead of the child list.
pub trait AnnotatedNode {
    fn annotated(&self) -> &Annotated;

    fn annotated_mut(&mut self) -> &mut Annotated;

    fn may_contain_text(&self) -> bool {
        false
    }
}

/// Accumulates the metadata seen around one construct: leading comments,
/// attribute annotations and nested foreign elements or comments.
///
/// Consumed by value when applied, so a bundle cannot be attached to more
/// than one node.
#[derive(Debug, Default)]
pub struct Annotations {
    comments: Vec<Comment>,
    attributes: Vec<AttributeAnnotation>,
    elements: Vec<AnnotationChild>,
    context: Context,
}

impl Annotations {
    pub fn new(comments: Vec<Comment>, context: Context) -> Self {
        Self {
            comments,
            attributes: Vec::new(),
            elements: Vec::new(),
            context,
        }
    }

    pub fn add_attribute(
        &mut self,
        namespace_uri: impl Into<String>,
        local_name: impl Into<String>,
        prefix: Option<String>,
        value: impl Into<String>,
        location: SourceLocation,
    ) {
        self.attributes.push(AttributeAnnotation {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
            prefix,
            value: value.into(),
            location,
        });
    }

    pub fn add_element(&mut self, element: ElementAnnotationBuilder) {
        element.add_to(&mut self.elements);
    }

    /// Adds comments interleaved with foreign elements; they keep their
    /// position relative to elements added before and after.
    pub fn add_comment(&mut self, comments: Vec<Comment>) {
        self.elements
            .extend(comments.into_iter().map(AnnotationChild::Comment));
    }

    pub fn add_leading_comment(&mut self, comments: Vec<Comment>) {
        self.comments.extend(comments);
    }

    /// Merges the accumulated metadata into `node` and captures the context
    /// snapshot. Consumes the bundle.
    pub fn apply<N: AnnotatedNode + ?Sized>(self, node: &mut N) {
        let into_following = node.may_contain_text();
        let annotated = node.annotated_mut();
        annotated.context = self.context;
        annotated.leading_comments.extend(self.comments);
        annotated.attribute_annotations.extend(self.attributes);
        let list = if into_following {
            &mut annotated.following_element_annotations
        } else {
            &mut annotated.child_element_annotations
        };
        list.extend(self.elements);
    }
}

/// Builds an [`ElementAnnotation`] from nested annotation events. Leading
/// comments seen before the element are replayed ahead of it when the
/// finished element is added to a list.
#[derive(Debug)]
pub struct ElementAnnotationBuilder {
    comments: Vec<Comment>,
    element: ElementAnnotation,
}

impl ElementAnnotationBuilder {
    pub fn new(
        namespace_uri: impl Into<String>,
        local_name: impl Into<String>,
        prefix: Option<String>,
        location: SourceLocation,
        comments: Vec<Comment>,
        context: Context,
    ) -> Self {
        Self {
            comments,
            element: ElementAnnotation {
                namespace_uri: namespace_uri.into(),
                local_name: local_name.into(),
                prefix,
                attributes: Vec::new(),
                children: Vec::new(),
                context,
                location,
            },
        }
    }

    pub fn add_text(&mut self, value: impl Into<String>, location: SourceLocation) {
        self.element.children.push(AnnotationChild::Text(TextAnnotation {
            value: value.into(),
            location,
        }));
    }

    pub fn add_attribute(
        &mut self,
        namespace_uri: impl Into<String>,
        local_name: impl Into<String>,
        prefix: Option<String>,
        value: impl Into<String>,
        location: SourceLocation,
    ) {
        self.element.attributes.push(AttributeAnnotation {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
            prefix,
            value: value.into(),
            location,
        });
    }

    pub fn add_element(&mut self, nested: ElementAnnotationBuilder) {
        nested.add_to(&mut self.element.children);
    }

    pub fn add_comment(&mut self, comments: Vec<Comment>) {
        self.element
            .children
            .extend(comments.into_iter().map(AnnotationChild::Comment));
    }

    pub fn add_leading_comment(&mut self, comments: Vec<Comment>) {
        self.comments.extend(comments);
    }

    pub(crate) fn add_to(self, list: &mut Vec<AnnotationChild>) {
        list.extend(self.comments.into_iter().map(AnnotationChild::Comment));
        list.push(AnnotationChild::Element(self.element));
    }
}
