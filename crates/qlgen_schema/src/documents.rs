//! Executable documents and the fragment registry built from them.

use crate::types::OperationKind;
use graphql_parser::query::{self as ast, Definition, OperationDefinition, TypeCondition};
use graphql_parser::Pos;
use indexmap::{IndexMap, IndexSet};
use qlgen_core::{Error, Location, Result};
use rustc_hash::FxHashMap;

/// Parsed executable document with owned strings.
pub type QueryDocument = ast::Document<'static, String>;
pub type SelectionSet = ast::SelectionSet<'static, String>;
pub type Selection = ast::Selection<'static, String>;
pub type FragmentDefinition = ast::FragmentDefinition<'static, String>;
pub type VariableDefinition = ast::VariableDefinition<'static, String>;
pub type Directive = ast::Directive<'static, String>;

/// One document plus the location it was loaded from.
#[derive(Debug, Clone)]
pub struct Source {
    pub location: String,
    pub document: QueryDocument,
}

impl Source {
    /// Parses a document.
    pub fn parse(location: impl Into<String>, text: &str) -> Result<Self> {
        let location = location.into();
        let document = ast::parse_query::<String>(text)
            .map_err(|e| Error::DocumentParse {
                location: location.clone(),
                message: e.to_string(),
            })?
            .into_static();
        Ok(Self { location, document })
    }

    /// Wraps an already parsed document.
    pub fn new(location: impl Into<String>, document: QueryDocument) -> Self {
        Self {
            location: location.into(),
            document,
        }
    }

    /// Operations in document order.
    pub fn operations(&self) -> impl Iterator<Item = Operation<'_>> {
        self.document.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(Operation::new(op)),
            Definition::Fragment(_) => None,
        })
    }

    /// Fragment definitions in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.document.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(fragment) => Some(fragment),
            Definition::Operation(_) => None,
        })
    }
}

/// A borrowed view over any of the four operation forms.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub kind: OperationKind,
    pub name: Option<&'a str>,
    pub variables: &'a [VariableDefinition],
    pub directives: &'a [Directive],
    pub selection_set: &'a SelectionSet,
    pub position: Pos,
    pub definition: &'a OperationDefinition<'static, String>,
}

impl<'a> Operation<'a> {
    fn new(definition: &'a OperationDefinition<'static, String>) -> Self {
        match definition {
            OperationDefinition::SelectionSet(set) => Self {
                kind: OperationKind::Query,
                name: None,
                variables: &[],
                directives: &[],
                selection_set: set,
                position: set.span.0,
                definition,
            },
            OperationDefinition::Query(q) => Self {
                kind: OperationKind::Query,
                name: q.name.as_deref(),
                variables: &q.variable_definitions,
                directives: &q.directives,
                selection_set: &q.selection_set,
                position: q.position,
                definition,
            },
            OperationDefinition::Mutation(m) => Self {
                kind: OperationKind::Mutation,
                name: m.name.as_deref(),
                variables: &m.variable_definitions,
                directives: &m.directives,
                selection_set: &m.selection_set,
                position: m.position,
                definition,
            },
            OperationDefinition::Subscription(s) => Self {
                kind: OperationKind::Subscription,
                name: s.name.as_deref(),
                variables: &s.variable_definitions,
                directives: &s.directives,
                selection_set: &s.selection_set,
                position: s.position,
                definition,
            },
        }
    }

    /// The position as a diagnostics location.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.position.line, self.position.column)
    }
}

/// Returns the type a fragment definition is declared on.
#[must_use]
pub fn type_condition(fragment: &FragmentDefinition) -> &str {
    let TypeCondition::On(name) = &fragment.type_condition;
    name
}

/// A registered fragment.
#[derive(Debug, Clone)]
pub struct FragmentEntry {
    pub definition: FragmentDefinition,
    /// Name of the type the fragment is declared on.
    pub type_condition: String,
    /// Document the fragment was read from.
    pub location: String,
    /// True for fragments supplied from outside the current documents.
    pub external: bool,
}

impl FragmentEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    #[must_use]
    pub fn selection_set(&self) -> &SelectionSet {
        &self.definition.selection_set
    }
}

/// All fragments known to one plugin invocation.
///
/// The registry is acyclic by construction: [`FragmentRegistry::build`]
/// rejects fragments that spread themselves.
#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    fragments: IndexMap<String, FragmentEntry>,
}

impl FragmentRegistry {
    /// Collects fragments from `sources` and `external`, rejecting duplicate
    /// names across documents and cyclic spreads.
    pub fn build(sources: &[Source], external: &[FragmentDefinition]) -> Result<Self> {
        let mut fragments = IndexMap::new();
        for source in sources {
            for fragment in source.fragments() {
                let entry = FragmentEntry {
                    definition: fragment.clone(),
                    type_condition: type_condition(fragment).to_string(),
                    location: source.location.clone(),
                    external: false,
                };
                if fragments.insert(fragment.name.clone(), entry).is_some() {
                    return Err(Error::DuplicateFragment {
                        name: fragment.name.clone(),
                    });
                }
            }
        }
        for fragment in external {
            if fragments.contains_key(&fragment.name) {
                tracing::debug!(fragment = %fragment.name, "document fragment shadows external fragment");
                continue;
            }
            fragments.insert(
                fragment.name.clone(),
                FragmentEntry {
                    definition: fragment.clone(),
                    type_condition: type_condition(fragment).to_string(),
                    location: String::from("<external>"),
                    external: true,
                },
            );
        }

        let registry = Self { fragments };
        registry.check_cycles()?;
        Ok(registry)
    }

    /// Looks up a fragment.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FragmentEntry> {
        self.fragments.get(name)
    }

    /// Looks up a fragment, failing with [`Error::UnknownFragment`].
    pub fn expect(&self, name: &str) -> Result<&FragmentEntry> {
        self.get(name).ok_or_else(|| Error::UnknownFragment {
            name: name.to_string(),
        })
    }

    /// Fragments in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FragmentEntry> {
        self.fragments.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Every fragment `selection_set` needs, transitively, in first-use
    /// order.
    pub fn dependencies(&self, selection_set: &SelectionSet) -> Result<Vec<&FragmentEntry>> {
        let mut seen = IndexSet::new();
        let mut pending = Vec::new();
        collect_spreads(selection_set, &mut pending);
        pending.reverse();

        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            let entry = self.expect(name)?;
            let mut nested = Vec::new();
            collect_spreads(entry.selection_set(), &mut nested);
            pending.extend(nested.into_iter().rev());
        }

        seen.into_iter().map(|name| self.expect(name)).collect()
    }

    fn check_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            registry: &'a FragmentRegistry,
            name: &'a str,
            marks: &mut FxHashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|n| *n == name).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(ToString::to_string).collect();
                    cycle.push(name.to_string());
                    return Err(Error::CyclicFragment { path: cycle });
                }
                None => {}
            }
            // Unknown spreads are reported when the selection is resolved.
            let Some(entry) = registry.get(name) else {
                return Ok(());
            };

            marks.insert(name, Mark::Visiting);
            path.push(name);
            let mut spreads = Vec::new();
            collect_spreads(entry.selection_set(), &mut spreads);
            for spread in spreads {
                visit(registry, spread, marks, path)?;
            }
            path.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = FxHashMap::default();
        let mut path = Vec::new();
        for name in self.fragments.keys() {
            visit(self, name, &mut marks, &mut path)?;
        }
        Ok(())
    }
}

/// Appends the names of all fragment spreads inside `set`, in document
/// order, including those nested in fields and inline fragments.
pub fn collect_spreads<'a>(set: &'a SelectionSet, out: &mut Vec<&'a str>) {
    for selection in &set.items {
        match selection {
            ast::Selection::Field(field) => collect_spreads(&field.selection_set, out),
            ast::Selection::FragmentSpread(spread) => out.push(&spread.fragment_name),
            ast::Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> Source {
        Source::parse("test.graphql", text).unwrap()
    }

    #[test]
    fn test_operations_and_fragments() {
        let src = source(
            "query Me { me { ...UserFields } }
             mutation { logout }
             { ping }
             fragment UserFields on User { id }",
        );
        let ops: Vec<_> = src.operations().collect();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].name, Some("Me"));
        assert_eq!(ops[1].kind, OperationKind::Mutation);
        assert_eq!(ops[2].kind, OperationKind::Query);
        assert!(ops[2].name.is_none());
        assert_eq!(src.fragments().count(), 1);
    }

    #[test]
    fn test_parse_error_carries_location() {
        let err = Source::parse("broken.graphql", "query {").unwrap_err();
        assert!(matches!(err, Error::DocumentParse { location, .. } if location == "broken.graphql"));
    }

    #[test]
    fn test_duplicate_fragment_rejected() {
        let a = source("fragment F on User { id }");
        let b = source("fragment F on User { name }");
        let err = FragmentRegistry::build(&[a, b], &[]).unwrap_err();
        assert!(matches!(err, Error::DuplicateFragment { name } if name == "F"));
    }

    #[test]
    fn test_self_reference_rejected() {
        let src = source("fragment A on User { id ...A }");
        let err = FragmentRegistry::build(&[src], &[]).unwrap_err();
        assert!(matches!(err, Error::CyclicFragment { path } if path == ["A", "A"]));
    }

    #[test]
    fn test_indirect_cycle_rejected() {
        let src = source(
            "fragment A on User { friends { ...B } }
             fragment B on User { ... on User { ...A } }",
        );
        let err = FragmentRegistry::build(&[src], &[]).unwrap_err();
        assert!(matches!(err, Error::CyclicFragment { path } if path == ["A", "B", "A"]));
    }

    #[test]
    fn test_external_fragments() {
        let external = source("fragment Ext on User { id }");
        let ext_defs: Vec<_> = external.fragments().cloned().collect();
        let src = source("query { me { ...Ext } }");
        let registry = FragmentRegistry::build(&[src], &ext_defs).unwrap();
        let entry = registry.get("Ext").unwrap();
        assert!(entry.external);
        assert_eq!(entry.type_condition, "User");
    }

    #[test]
    fn test_dependencies_transitive_in_order() {
        let src = source(
            "query Q { me { ...A ...C } }
             fragment A on User { ...B }
             fragment B on User { id }
             fragment C on User { name ...B }",
        );
        let registry = FragmentRegistry::build(std::slice::from_ref(&src), &[]).unwrap();
        let op = src.operations().next().unwrap();
        let deps: Vec<&str> = registry
            .dependencies(op.selection_set)
            .unwrap()
            .into_iter()
            .map(FragmentEntry::name)
            .collect();
        assert_eq!(deps, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dependencies_unknown_fragment() {
        let src = source("query Q { me { ...Missing } }");
        let registry = FragmentRegistry::build(std::slice::from_ref(&src), &[]).unwrap();
        let op = src.operations().next().unwrap();
        assert!(matches!(
            registry.dependencies(op.selection_set),
            Err(Error::UnknownFragment { .. })
        ));
    }
}
