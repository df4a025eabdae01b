use std::collections::BTreeMap;

/// Marker for a namespace that is inherited from the referencing document
/// rather than written out. `ExternalRef` and `Include` store it verbatim;
/// prefix resolution treats it as unbound.
///
/// The leading NUL keeps it distinct from every URI a schema can declare.
pub const INHERIT_NS: &str = "\u{0}inherit";

/// Namespace-resolution facilities a datatype may consult while validating a
/// literal (e.g. QName resolving the prefix of its value).
pub trait ValidationContext {
    fn resolve_namespace_prefix(&self, prefix: &str) -> Option<String>;

    fn base_uri(&self) -> Option<&str>;

    fn is_unparsed_entity(&self, _name: &str) -> bool {
        false
    }

    fn is_notation(&self, _name: &str) -> bool {
        false
    }
}

/// Snapshot of the namespace declarations in scope at one point of a schema
/// document. A clone is attached to every node at finalization, so a node's
/// context is independent of later mutation of the live one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub base_uri: Option<String>,
    pub default_namespace: Option<String>,
    prefixes: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_uri(uri: impl Into<String>) -> Self {
        Self {
            base_uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn bind_prefix(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), uri.into());
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }
}

impl ValidationContext for Context {
    fn resolve_namespace_prefix(&self, prefix: &str) -> Option<String> {
        if prefix.is_empty() {
            self.default_namespace.clone()
        } else {
            self.prefixes.get(prefix).cloned()
        }
    }

    fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_bound_prefix() {
        let mut context = Context::new();
        context.bind_prefix("xs", "http://www.w3.org/2001/XMLSchema");

        assert_eq!(
            context.resolve_namespace_prefix("xs").as_deref(),
            Some("http://www.w3.org/2001/XMLSchema")
        );
        assert_eq!(context.resolve_namespace_prefix("other"), None);
    }

    #[test]
    fn snapshot_exposes_base_uri_and_bound_prefixes() {
        let mut context = Context::with_base_uri("http://example.com/schema.rng");
        context.bind_prefix("b", "http://example.com/b");
        context.bind_prefix("a", "http://example.com/a");

        assert_eq!(context.base_uri(), Some("http://example.com/schema.rng"));
        assert_eq!(
            context.prefixes().collect::<Vec<_>>(),
            [
                ("a", "http://example.com/a"),
                ("b", "http://example.com/b"),
            ]
        );
    }

    #[test]
    fn empty_prefix_resolves_to_default_namespace() {
        let mut context = Context::new();
        assert_eq!(context.resolve_namespace_prefix(""), None);

        context.default_namespace = Some("http://example.com/ns".into());
        assert_eq!(
            context.resolve_namespace_prefix("").as_deref(),
            Some("http://example.com/ns")
        );
    }
}
