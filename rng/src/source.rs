use crate::builder::{GrammarSection, SchemaBuilder};
use crate::error::BuildError;
use crate::pattern::Pattern;

/// The component that turns raw schema syntax into construction calls on a
/// [`SchemaBuilder`]. All I/O happens behind this trait.
///
/// `parse_include` and `parse_external` are invoked by the builder itself
/// while it resolves a reference, so an implementation may re-enter the
/// builder recursively; the builder's cache bounds that recursion.
pub trait SchemaSource {
    /// Parses the main document, driving `builder` bottom-up and returning
    /// the finished root pattern.
    fn parse(&self, builder: &mut SchemaBuilder) -> Result<Pattern, BuildError>;

    /// Parses the document included from `uri` into `grammar`, a fresh
    /// section for the included document's own grammar, and returns the
    /// pattern produced by ending that section.
    fn parse_include(
        &self,
        uri: &str,
        builder: &mut SchemaBuilder,
        grammar: GrammarSection,
    ) -> Result<Pattern, BuildError>;

    /// Parses the document referenced wholesale from `uri`.
    fn parse_external(&self, uri: &str, builder: &mut SchemaBuilder)
        -> Result<Pattern, BuildError>;
}
