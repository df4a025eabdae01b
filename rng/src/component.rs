//! Grammar components: definitions, div groupings and includes.

use std::collections::HashMap;

use crate::annotation::{Annotated, AnnotatedNode};
use crate::pattern::{Pattern, PatternKind};

/// Reserved definition name for the start pattern of a grammar.
///
/// The leading NUL keeps it distinct from every name a schema can declare,
/// so a user definition literally called "start" never collides with the
/// `<start>` element.
pub const START_NAME: &str = "\u{0}start";

/// Policy for merging multiple definitions that share one name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combine {
    Choice,
    Interleave,
}

/// A member of a grammar section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Define(DefineComponent),
    Div(DivComponent),
    Include(IncludeComponent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefineComponent {
    pub annotated: Annotated,
    /// Definition name; [`START_NAME`] for the start pattern.
    pub name: String,
    pub combine: Option<Combine>,
    pub body: Pattern,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivComponent {
    pub annotated: Annotated,
    pub components: Vec<Component>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeComponent {
    pub annotated: Annotated,
    pub href: String,
    /// Namespace inherited by the included document; [`INHERIT_NS`] when not
    /// written out.
    ///
    /// [`INHERIT_NS`]: crate::context::INHERIT_NS
    pub ns: String,
    /// Components of the include body; these override definitions of equal
    /// name from the included document.
    pub components: Vec<Component>,
}

impl AnnotatedNode for Component {
    fn annotated(&self) -> &Annotated {
        match self {
            Self::Define(define) => &define.annotated,
            Self::Div(div) => &div.annotated,
            Self::Include(include) => &include.annotated,
        }
    }

    fn annotated_mut(&mut self) -> &mut Annotated {
        match self {
            Self::Define(define) => &mut define.annotated,
            Self::Div(div) => &mut div.annotated,
            Self::Include(include) => &mut include.annotated,
        }
    }
}

/// Resolves a definition name through a component list, honoring include
/// override semantics: a definition in an include body shadows definitions
/// of the same name from the included document, whose raw pattern is looked
/// up in `schemas` (the URI map produced by a build).
///
/// Combine rules are deliberately not merged here; the first definition
/// found wins, matching the permissive behavior of the builder itself.
pub fn effective_define<'a>(
    schemas: &'a HashMap<String, Pattern>,
    components: &'a [Component],
    name: &str,
) -> Option<&'a Pattern> {
    effective_define_in(schemas, components, name, &mut Vec::new())
}

fn effective_define_in<'a>(
    schemas: &'a HashMap<String, Pattern>,
    components: &'a [Component],
    name: &str,
    visited: &mut Vec<&'a str>,
) -> Option<&'a Pattern> {
    for component in components {
        match component {
            Component::Define(define) if define.name == name => return Some(&define.body),
            Component::Define(_) => {}
            Component::Div(div) => {
                if let Some(found) = effective_define_in(schemas, &div.components, name, visited) {
                    return Some(found);
                }
            }
            Component::Include(include) => {
                if let Some(found) = effective_define_in(schemas, &include.components, name, visited)
                {
                    return Some(found);
                }
                // Cyclic includes are legal after cycle-guarding; don't
                // descend into a document twice.
                if visited.contains(&include.href.as_str()) {
                    continue;
                }
                visited.push(&include.href);
                if let Some(Pattern {
                    kind: PatternKind::Grammar(included),
                    ..
                }) = schemas.get(&include.href)
                {
                    if let Some(found) = effective_define_in(schemas, included, name, visited) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternKind;

    fn define(name: &str, kind: PatternKind) -> Component {
        Component::Define(DefineComponent {
            annotated: Annotated::default(),
            name: name.into(),
            combine: None,
            body: Pattern::new(kind),
        })
    }

    #[test]
    fn include_body_overrides_included_document() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "b.rng".to_string(),
            Pattern::new(PatternKind::Grammar(vec![define(
                START_NAME,
                PatternKind::Empty,
            )])),
        );
        let components = vec![Component::Include(IncludeComponent {
            annotated: Annotated::default(),
            href: "b.rng".into(),
            ns: String::new(),
            components: vec![define(START_NAME, PatternKind::NotAllowed)],
        })];

        let body = effective_define(&schemas, &components, START_NAME).unwrap();
        assert!(matches!(body.kind, PatternKind::NotAllowed));
    }

    #[test]
    fn falls_through_to_included_document() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "b.rng".to_string(),
            Pattern::new(PatternKind::Grammar(vec![define("item", PatternKind::Text)])),
        );
        let components = vec![Component::Include(IncludeComponent {
            annotated: Annotated::default(),
            href: "b.rng".into(),
            ns: String::new(),
            components: Vec::new(),
        })];

        let body = effective_define(&schemas, &components, "item").unwrap();
        assert!(matches!(body.kind, PatternKind::Text));
    }

    #[test]
    fn lookup_terminates_on_cyclic_includes() {
        let include = |href: &str| {
            Component::Include(IncludeComponent {
                annotated: Annotated::default(),
                href: href.into(),
                ns: String::new(),
                components: Vec::new(),
            })
        };
        let mut schemas = HashMap::new();
        schemas.insert(
            "a.rng".to_string(),
            Pattern::new(PatternKind::Grammar(vec![include("b.rng")])),
        );
        schemas.insert(
            "b.rng".to_string(),
            Pattern::new(PatternKind::Grammar(vec![include("a.rng")])),
        );

        let components = vec![include("a.rng")];
        assert_eq!(effective_define(&schemas, &components, "missing"), None);
    }
}
