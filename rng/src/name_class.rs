//! Name classes: which element or attribute names a pattern matches.

use crate::annotation::{Annotated, AnnotatedNode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameClass {
    pub annotated: Annotated,
    pub kind: NameClassKind,
}

impl NameClass {
    pub(crate) fn new(kind: NameClassKind) -> Self {
        Self {
            annotated: Annotated::default(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameClassKind {
    Choice(Vec<NameClass>),
    Name {
        namespace_uri: String,
        local_name: String,
        /// Prefix the name was written with, kept for round-tripping.
        prefix: Option<String>,
    },
    NsName {
        namespace_uri: String,
        except: Option<Box<NameClass>>,
    },
    AnyName {
        except: Option<Box<NameClass>>,
    },
}

impl AnnotatedNode for NameClass {
    fn annotated(&self) -> &Annotated {
        &self.annotated
    }

    fn annotated_mut(&mut self) -> &mut Annotated {
        &mut self.annotated
    }

    // <name> holds its qualified name as character data.
    fn may_contain_text(&self) -> bool {
        matches!(self.kind, NameClassKind::Name { .. })
    }
}
