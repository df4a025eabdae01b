//! Assembles the schema tree from construction events emitted by a
//! [`SchemaSource`], resolving cross-document references through a per-build
//! cache and interleaving annotation metadata onto the nodes as they are
//! finalized.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::annotation::{
    Annotated, AnnotatedNode, AnnotationChild, Annotations, Comment, ElementAnnotationBuilder,
};
use crate::component::{
    effective_define, Combine, Component, DefineComponent, DivComponent, IncludeComponent,
    START_NAME,
};
use crate::context::{Context, ValidationContext, INHERIT_NS};
use crate::datatype::{DatatypeBuilder, DatatypeError, DatatypeLibraryFactory};
use crate::diagnostic::{keys, Diagnostic, ErrorSink};
use crate::error::{BuildError, SchemaError};
use crate::location::SourceLocation;
use crate::name_class::{NameClass, NameClassKind};
use crate::pattern::{DataPattern, Param, Pattern, PatternKind, ValuePattern};
use crate::source::SchemaSource;

/// Result of a successful build: the main document's pattern plus the
/// resolved pattern of every document visited through an include or external
/// reference, keyed by URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaCollection {
    pub main: Pattern,
    pub schemas: HashMap<String, Pattern>,
}

impl SchemaCollection {
    /// The start pattern the main grammar effectively defines, with include
    /// bodies overriding included documents.
    pub fn effective_start(&self) -> Option<&Pattern> {
        match &self.main.kind {
            PatternKind::Grammar(components) => {
                effective_define(&self.schemas, components, START_NAME)
            }
            _ => None,
        }
    }
}

/// Cache entry for one referenced URI. `InProgress` marks a resolution that
/// is still on the call stack; meeting it again means a cyclic reference and
/// short-circuits instead of re-entering the source.
enum SchemaEntry {
    InProgress,
    Resolved(Pattern),
}

/// Builds a schema from one document and everything it references.
///
/// Each top-level build owns its own builder (and thus its own cache);
/// builders are not shared between builds.
pub struct SchemaBuilder<'a> {
    source: &'a dyn SchemaSource,
    sink: &'a mut dyn ErrorSink,
    datatypes: &'a dyn DatatypeLibraryFactory,
    schemas: HashMap<String, SchemaEntry>,
    had_error: bool,
}

/// Parses a schema: drives `source` over the main document, resolving
/// includes and external references as they appear.
///
/// Returns [`SchemaError::IncorrectSchema`] when any diagnostic was
/// reported, even if a structurally complete tree was produced.
pub fn parse(
    source: &dyn SchemaSource,
    sink: &mut dyn ErrorSink,
    datatypes: &dyn DatatypeLibraryFactory,
) -> Result<SchemaCollection, SchemaError> {
    let mut builder = SchemaBuilder {
        source,
        sink,
        datatypes,
        schemas: HashMap::new(),
        had_error: false,
    };
    let main = source.parse(&mut builder)?;
    if builder.had_error {
        return Err(SchemaError::IncorrectSchema);
    }
    let schemas = builder
        .schemas
        .into_iter()
        .filter_map(|(uri, entry)| match entry {
            SchemaEntry::Resolved(pattern) => Some((uri, pattern)),
            // An in-progress entry can only survive if its resolution frame
            // is still open, which it is not once the main parse returned.
            SchemaEntry::InProgress => None,
        })
        .collect();
    Ok(SchemaCollection { main, schemas })
}

/// Sets the source location and merges the pending annotation bundle; every
/// node passes through here exactly once, on its way back to the caller.
fn finish<N: AnnotatedNode>(
    mut node: N,
    location: SourceLocation,
    annotations: Option<Annotations>,
) -> N {
    node.annotated_mut().location = location;
    if let Some(annotations) = annotations {
        annotations.apply(&mut node);
    }
    node
}

impl<'a> SchemaBuilder<'a> {
    fn error(&mut self, key: &'static str, args: Vec<String>, location: SourceLocation) {
        self.had_error = true;
        self.sink.report(Diagnostic {
            key,
            args,
            location,
        });
    }

    fn diagnose_datatype_error(
        &mut self,
        detail_key: &'static str,
        no_detail_key: &'static str,
        error: DatatypeError,
        location: SourceLocation,
    ) {
        match error.detail {
            Some(detail) => self.error(detail_key, vec![detail], location),
            None => self.error(no_detail_key, Vec::new(), location),
        }
    }

    pub fn make_choice(
        &self,
        patterns: Vec<Pattern>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(Pattern::new(PatternKind::Choice(patterns)), location, annotations)
    }

    pub fn make_group(
        &self,
        patterns: Vec<Pattern>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(Pattern::new(PatternKind::Group(patterns)), location, annotations)
    }

    pub fn make_interleave(
        &self,
        patterns: Vec<Pattern>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::Interleave(patterns)),
            location,
            annotations,
        )
    }

    pub fn make_one_or_more(
        &self,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::OneOrMore(Box::new(pattern))),
            location,
            annotations,
        )
    }

    pub fn make_zero_or_more(
        &self,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::ZeroOrMore(Box::new(pattern))),
            location,
            annotations,
        )
    }

    pub fn make_optional(
        &self,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::Optional(Box::new(pattern))),
            location,
            annotations,
        )
    }

    pub fn make_list(
        &self,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::List(Box::new(pattern))),
            location,
            annotations,
        )
    }

    pub fn make_mixed(
        &self,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::Mixed(Box::new(pattern))),
            location,
            annotations,
        )
    }

    pub fn make_empty(&self, location: SourceLocation, annotations: Option<Annotations>) -> Pattern {
        finish(Pattern::new(PatternKind::Empty), location, annotations)
    }

    pub fn make_not_allowed(
        &self,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(Pattern::new(PatternKind::NotAllowed), location, annotations)
    }

    pub fn make_text(&self, location: SourceLocation, annotations: Option<Annotations>) -> Pattern {
        finish(Pattern::new(PatternKind::Text), location, annotations)
    }

    pub fn make_attribute(
        &self,
        name_class: NameClass,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::Attribute {
                name_class,
                pattern: Box::new(pattern),
            }),
            location,
            annotations,
        )
    }

    pub fn make_element(
        &self,
        name_class: NameClass,
        pattern: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::Element {
                name_class,
                pattern: Box::new(pattern),
            }),
            location,
            annotations,
        )
    }

    pub fn make_ref(
        &self,
        name: impl Into<String>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(Pattern::new(PatternKind::Ref(name.into())), location, annotations)
    }

    pub fn make_parent_ref(
        &self,
        name: impl Into<String>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern::new(PatternKind::ParentRef(name.into())),
            location,
            annotations,
        )
    }

    pub fn make_name_class_choice(
        &self,
        name_classes: Vec<NameClass>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> NameClass {
        finish(
            NameClass::new(NameClassKind::Choice(name_classes)),
            location,
            annotations,
        )
    }

    pub fn make_name(
        &self,
        namespace_uri: &str,
        local_name: &str,
        prefix: Option<String>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> NameClass {
        finish(
            NameClass::new(NameClassKind::Name {
                namespace_uri: namespace_uri.to_string(),
                local_name: local_name.to_string(),
                prefix,
            }),
            location,
            annotations,
        )
    }

    pub fn make_ns_name(
        &self,
        namespace_uri: &str,
        except: Option<NameClass>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> NameClass {
        finish(
            NameClass::new(NameClassKind::NsName {
                namespace_uri: namespace_uri.to_string(),
                except: except.map(Box::new),
            }),
            location,
            annotations,
        )
    }

    pub fn make_any_name(
        &self,
        except: Option<NameClass>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> NameClass {
        finish(
            NameClass::new(NameClassKind::AnyName {
                except: except.map(Box::new),
            }),
            location,
            annotations,
        )
    }

    /// Builds a `<value>` pattern and validates the literal right away.
    /// Every failed stage becomes a diagnostic; the node is produced either
    /// way, merely unvalidated.
    pub fn make_value(
        &mut self,
        datatype_library: &str,
        type_name: &str,
        value: &str,
        context: &Context,
        ns: &str,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        let mut pattern = ValuePattern::new(datatype_library, type_name, value);
        let factory = self.datatypes;
        match factory.create_datatype_library(datatype_library) {
            Some(library) => match library.create_datatype_builder(type_name) {
                Ok(builder) => match builder.into_datatype() {
                    Ok(datatype) => {
                        let checked = if datatype.is_context_dependent() {
                            let trace = TraceValidationContext::new(context, ns);
                            let checked = datatype.check_valid(value, &trace);
                            pattern.prefix_map = trace.into_prefix_map();
                            checked
                        } else {
                            datatype.check_valid(value, context)
                        };
                        if let Err(error) = checked {
                            self.diagnose_datatype_error(
                                keys::INVALID_VALUE_DETAIL,
                                keys::INVALID_VALUE,
                                error,
                                location.clone(),
                            );
                        }
                    }
                    Err(error) => self.diagnose_datatype_error(
                        keys::INVALID_PARAMS_DETAIL,
                        keys::INVALID_PARAMS,
                        error,
                        location.clone(),
                    ),
                },
                Err(error) => self.unsupported_datatype(
                    datatype_library,
                    type_name,
                    error,
                    location.clone(),
                ),
            },
            None => self.error(
                keys::UNKNOWN_DATATYPE,
                vec![datatype_library.to_string(), type_name.to_string()],
                location.clone(),
            ),
        }
        finish(Pattern::new(PatternKind::Value(pattern)), location, annotations)
    }

    fn unsupported_datatype(
        &mut self,
        datatype_library: &str,
        type_name: &str,
        error: DatatypeError,
        location: SourceLocation,
    ) {
        match error.detail {
            Some(detail) => self.error(
                keys::UNSUPPORTED_DATATYPE_DETAIL,
                vec![datatype_library.to_string(), type_name.to_string(), detail],
                location,
            ),
            None => self.error(
                keys::UNKNOWN_DATATYPE,
                vec![datatype_library.to_string(), type_name.to_string()],
                location,
            ),
        }
    }

    /// Starts the staged protocol for a `<data>` pattern. A failure while
    /// binding library and type is reported here but leaves the returned
    /// builder usable, so parameter events can keep flowing.
    pub fn make_data_pattern_builder(
        &mut self,
        datatype_library: &str,
        type_name: &str,
        location: SourceLocation,
    ) -> DataPatternBuilder {
        let factory = self.datatypes;
        let mut datatype_builder = None;
        match factory.create_datatype_library(datatype_library) {
            Some(library) => match library.create_datatype_builder(type_name) {
                Ok(builder) => datatype_builder = Some(builder),
                Err(error) => {
                    self.unsupported_datatype(datatype_library, type_name, error, location)
                }
            },
            None => self.error(
                keys::UNKNOWN_DATATYPE,
                vec![datatype_library.to_string(), type_name.to_string()],
                location,
            ),
        }
        DataPatternBuilder {
            pattern: DataPattern {
                datatype_library: datatype_library.to_string(),
                type_name: type_name.to_string(),
                params: Vec::new(),
                except: None,
            },
            datatype_builder,
        }
    }

    /// Builds an external reference and resolves the referenced document
    /// through the cache, at most once per URI.
    pub fn make_external_ref(
        &mut self,
        uri: &str,
        ns: &str,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Result<Pattern, BuildError> {
        let pattern = finish(
            Pattern::new(PatternKind::ExternalRef {
                href: uri.to_string(),
                ns: ns.to_string(),
            }),
            location,
            annotations,
        );
        if !self.schemas.contains_key(uri) {
            self.schemas
                .insert(uri.to_string(), SchemaEntry::InProgress);
            let source = self.source;
            match source.parse_external(uri, self) {
                Ok(resolved) => {
                    self.schemas
                        .insert(uri.to_string(), SchemaEntry::Resolved(resolved));
                }
                Err(error) => {
                    // Evict the in-progress marker so a later attempt (e.g.
                    // an editor retrying) is not blocked by a bogus entry.
                    self.schemas.remove(uri);
                    self.had_error = true;
                    return Err(error);
                }
            }
        }
        Ok(pattern)
    }

    pub(crate) fn resolve_include(&mut self, uri: &str) -> Result<(), BuildError> {
        if self.schemas.contains_key(uri) {
            return Ok(());
        }
        self.schemas
            .insert(uri.to_string(), SchemaEntry::InProgress);
        let source = self.source;
        match source.parse_include(uri, self, GrammarSection::new()) {
            Ok(pattern) => {
                self.schemas
                    .insert(uri.to_string(), SchemaEntry::Resolved(pattern));
                Ok(())
            }
            Err(error) => {
                self.schemas.remove(uri);
                self.had_error = true;
                Err(error)
            }
        }
    }

    /// Opens a grammar section for a `<grammar>` pattern.
    pub fn make_grammar(&self) -> GrammarSection {
        GrammarSection::new()
    }

    pub fn make_annotations(&self, comments: Vec<Comment>, context: &Context) -> Annotations {
        Annotations::new(comments, context.clone())
    }

    /// Merges a late annotation bundle into an already finished node.
    pub fn annotate<N: AnnotatedNode>(&self, node: &mut N, annotations: Annotations) {
        annotations.apply(node);
    }

    /// Attaches a foreign element that textually follows `node`.
    pub fn annotate_after<N: AnnotatedNode>(&self, node: &mut N, element: ElementAnnotationBuilder) {
        element.add_to(&mut node.annotated_mut().following_element_annotations);
    }

    /// Attaches comments that textually follow `node`.
    pub fn comment_after<N: AnnotatedNode>(&self, node: &mut N, comments: Vec<Comment>) {
        node.annotated_mut()
            .following_element_annotations
            .extend(comments.into_iter().map(AnnotationChild::Comment));
    }
}

/// Records the prefixes a context-dependent datatype resolves during
/// validation into the value pattern's own prefix map.
struct TraceValidationContext<'a> {
    prefix_map: RefCell<BTreeMap<String, String>>,
    context: &'a Context,
    ns: Option<&'a str>,
}

impl<'a> TraceValidationContext<'a> {
    fn new(context: &'a Context, ns: &'a str) -> Self {
        Self {
            prefix_map: RefCell::new(BTreeMap::new()),
            context,
            ns: if ns.is_empty() { None } else { Some(ns) },
        }
    }

    fn into_prefix_map(self) -> BTreeMap<String, String> {
        self.prefix_map.into_inner()
    }
}

impl ValidationContext for TraceValidationContext<'_> {
    fn resolve_namespace_prefix(&self, prefix: &str) -> Option<String> {
        let result = if prefix.is_empty() {
            self.ns.map(str::to_string)
        } else {
            match self.context.resolve_namespace_prefix(prefix) {
                Some(uri) if uri == INHERIT_NS => return None,
                other => other,
            }
        };
        if let Some(uri) = &result {
            self.prefix_map
                .borrow_mut()
                .insert(prefix.to_string(), uri.clone());
        }
        result
    }

    fn base_uri(&self) -> Option<&str> {
        self.context.base_uri()
    }

    fn is_unparsed_entity(&self, name: &str) -> bool {
        self.context.is_unparsed_entity(name)
    }

    fn is_notation(&self, name: &str) -> bool {
        self.context.is_notation(name)
    }
}

/// Staged construction of a `<data>` pattern. Parameter declarations are
/// kept on the pattern verbatim and, while the datatype builder is live,
/// forwarded to it; each failure becomes a diagnostic without dropping data
/// from the tree.
pub struct DataPatternBuilder {
    pattern: DataPattern,
    datatype_builder: Option<Box<dyn DatatypeBuilder>>,
}

impl DataPatternBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn add_param(
        &mut self,
        builder: &mut SchemaBuilder<'_>,
        name: &str,
        value: &str,
        context: &Context,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) {
        let mut param = Param::new(name, value);
        param.annotated.context = context.clone();
        let param = finish(param, location.clone(), annotations);
        self.pattern.params.push(param);
        if let Some(datatype_builder) = &mut self.datatype_builder {
            if let Err(error) = datatype_builder.add_parameter(name, value, context) {
                builder.diagnose_datatype_error(
                    keys::INVALID_PARAM_DETAIL,
                    keys::INVALID_PARAM,
                    error,
                    location,
                );
            }
        }
    }

    /// Finalizes the pattern, attempting to build the datatype so that
    /// inconsistent parameters are diagnosed.
    pub fn into_pattern(
        mut self,
        builder: &mut SchemaBuilder<'_>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        if let Some(datatype_builder) = self.datatype_builder.take() {
            if let Err(error) = datatype_builder.into_datatype() {
                builder.diagnose_datatype_error(
                    keys::INVALID_PARAMS_DETAIL,
                    keys::INVALID_PARAMS,
                    error,
                    location.clone(),
                );
            }
        }
        finish(Pattern::new(PatternKind::Data(self.pattern)), location, annotations)
    }

    /// Finalizes the pattern with an except clause.
    pub fn into_pattern_with_except(
        mut self,
        except: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        self.pattern.except = Some(Box::new(except));
        finish(Pattern::new(PatternKind::Data(self.pattern)), location, annotations)
    }
}

/// One open grammar section: a `<grammar>`, `<div>` or `<include>` body.
///
/// The section owns its component list and the metadata of its subject node
/// until it is closed. Metadata arriving between components attaches to the
/// most recently added component's following list; metadata arriving before
/// any component attaches to the subject itself.
pub struct GrammarSection {
    subject: Annotated,
    components: Vec<Component>,
}

impl GrammarSection {
    pub(crate) fn new() -> Self {
        Self {
            subject: Annotated::default(),
            components: Vec::new(),
        }
    }

    fn add_define(
        &mut self,
        name: String,
        combine: Option<Combine>,
        body: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) {
        let component = finish(
            Component::Define(DefineComponent {
                annotated: Annotated::default(),
                name,
                combine,
                body,
            }),
            location,
            annotations,
        );
        self.components.push(component);
    }

    pub fn define(
        &mut self,
        name: &str,
        combine: Option<Combine>,
        body: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) {
        self.add_define(name.to_string(), combine, body, location, annotations);
    }

    /// Adds the start definition, normalized to the reserved internal name.
    pub fn define_start(
        &mut self,
        combine: Option<Combine>,
        body: Pattern,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) {
        self.add_define(START_NAME.to_string(), combine, body, location, annotations);
    }

    /// Opens a nested `<div>` section. Close it with [`close_div`].
    ///
    /// [`close_div`]: Self::close_div
    pub fn open_div(&self) -> GrammarSection {
        GrammarSection::new()
    }

    pub fn close_div(
        &mut self,
        div: GrammarSection,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) {
        let component = finish(
            Component::Div(DivComponent {
                annotated: div.subject,
                components: div.components,
            }),
            location,
            annotations,
        );
        self.components.push(component);
    }

    /// Opens a nested `<include>` section. Close it with [`close_include`].
    ///
    /// [`close_include`]: Self::close_include
    pub fn open_include(&self) -> GrammarSection {
        GrammarSection::new()
    }

    /// Closes an include body and resolves the included document through the
    /// builder's cache. The include component stays in the tree even when
    /// resolution fails.
    pub fn close_include(
        &mut self,
        include: GrammarSection,
        uri: &str,
        ns: &str,
        builder: &mut SchemaBuilder<'_>,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Result<(), BuildError> {
        let component = finish(
            Component::Include(IncludeComponent {
                annotated: include.subject,
                href: uri.to_string(),
                ns: ns.to_string(),
                components: include.components,
            }),
            location,
            annotations,
        );
        self.components.push(component);
        builder.resolve_include(uri)
    }

    /// Attaches a foreign element that appears between components.
    pub fn top_level_annotation(&mut self, element: ElementAnnotationBuilder) {
        match self.components.last_mut() {
            Some(component) => {
                element.add_to(&mut component.annotated_mut().following_element_annotations)
            }
            None => element.add_to(&mut self.subject.child_element_annotations),
        }
    }

    /// Attaches comments that appear between components.
    pub fn top_level_comment(&mut self, comments: Vec<Comment>) {
        let comments = comments.into_iter().map(AnnotationChild::Comment);
        match self.components.last_mut() {
            Some(component) => component
                .annotated_mut()
                .following_element_annotations
                .extend(comments),
            None => self.subject.child_element_annotations.extend(comments),
        }
    }

    /// Closes the section as a `<grammar>` pattern.
    pub fn end_grammar(
        self,
        location: SourceLocation,
        annotations: Option<Annotations>,
    ) -> Pattern {
        finish(
            Pattern {
                annotated: self.subject,
                kind: PatternKind::Grammar(self.components),
            },
            location,
            annotations,
        )
    }
}
