//! Shape resolution against a small schema.

use std::collections::BTreeSet;

use qlgen_core::Error;
use qlgen_schema::{FragmentRegistry, Schema, Selection, SelectionSet, Source};
use qlgen_shape::{
    Dialect, Flow, NullableStyle, PickProcessor, PreResolvedProcessor, ScalarMap,
    SelectionSetProcessor, ShapeEnv, ShapeOptions, ShapeResolver, TypeNames, TypeScript,
};

const SDL: &str = r#"
type Query {
  user: User
  node(id: ID!): Node
  search: [SearchResult!]!
  matrix: Matrix!
}

type Matrix {
  a: [String]
  b: [String]!
  c: [String!]
  d: [String!]!
}

interface Node {
  id: ID!
}

type User implements Node {
  id: ID!
  name: String
  role: Role!
  friends: [User!]!
}

type Post implements Node {
  id: ID!
  title: String!
}

union SearchResult = User | Post

enum Role {
  ADMIN
  MEMBER
}
"#;

struct Fixture {
    schema: Schema,
    source: Source,
    fragments: FragmentRegistry,
}

impl Fixture {
    fn new(query: &str) -> Self {
        let schema = Schema::parse(SDL).unwrap();
        let source = Source::parse("query.graphql", query).unwrap();
        let fragments = FragmentRegistry::build(std::slice::from_ref(&source), &[]).unwrap();
        Self {
            schema,
            source,
            fragments,
        }
    }

    fn selection(&self, path: &[&str]) -> &SelectionSet {
        let mut set = self.source.operations().next().unwrap().selection_set;
        for name in path {
            set = set
                .items
                .iter()
                .find_map(|item| match item {
                    Selection::Field(field) if field.name == *name => Some(&field.selection_set),
                    _ => None,
                })
                .unwrap();
        }
        set
    }

    fn resolve(
        &self,
        parent: &str,
        path: &[&str],
        processor: &dyn SelectionSetProcessor,
        dialect: &dyn Dialect,
        options: ShapeOptions,
    ) -> qlgen_core::Result<String> {
        let scalars = ScalarMap::typescript();
        let names = TypeNames::default();
        let env = ShapeEnv {
            schema: &self.schema,
            dialect,
            scalars: &scalars,
            names: &names,
            options,
        };
        ShapeResolver::new(env, &self.fragments, processor).resolve(parent, self.selection(path))
    }

    fn pick(&self, parent: &str, path: &[&str], options: ShapeOptions) -> String {
        self.resolve(parent, path, &PickProcessor, &TypeScript::default(), options)
            .unwrap()
    }

    fn pre_resolved(&self, parent: &str, path: &[&str], options: ShapeOptions) -> String {
        let dialect = TypeScript::new(NullableStyle::NullUnion);
        self.resolve(parent, path, &PreResolvedProcessor, &dialect, options)
            .unwrap()
    }
}

fn skip_typename() -> ShapeOptions {
    ShapeOptions {
        skip_typename: true,
        ..ShapeOptions::default()
    }
}

/// Field names mentioned by a flat rendered shape: object keys plus the keys
/// of a `Pick<..>`.
fn field_names(rendered: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let bytes = rendered.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte != b':' {
            continue;
        }
        let mut end = i;
        if end > 0 && bytes[end - 1] == b'?' {
            end -= 1;
        }
        let start = rendered[..end]
            .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
            .map_or(0, |p| p + 1);
        if start < end {
            names.insert(rendered[start..end].to_string());
        }
    }
    if let Some(start) = rendered.find("Pick<") {
        let rest = &rendered[start..];
        let from = rest.find(", ").unwrap() + 2;
        let to = rest.find('>').unwrap();
        for key in rest[from..to].split(" | ") {
            names.insert(key.trim_matches('\'').to_string());
        }
    }
    names
}

#[test]
fn test_user_example_pick_and_pre_resolved() {
    let fx = Fixture::new("{ user { id name } }");
    assert_eq!(
        fx.pick("Query", &[], skip_typename()),
        "{ user?: Maybe<Pick<User, 'id' | 'name'>> }"
    );
    assert_eq!(
        fx.pre_resolved("Query", &[], skip_typename()),
        "{ user?: { id: string; name?: string } }"
    );
}

#[test]
fn test_implicit_typename() {
    let fx = Fixture::new("{ user { id } }");
    insta::assert_snapshot!(
        fx.pick("Query", &[], ShapeOptions::default()),
        @"{ __typename?: 'Query' } & { user?: Maybe<{ __typename?: 'User' } & Pick<User, 'id'>> }"
    );

    let options = ShapeOptions {
        non_optional_typename: true,
        ..ShapeOptions::default()
    };
    assert_eq!(
        fx.pre_resolved("User", &["user"], options),
        "{ __typename: 'User'; id: string }"
    );
}

#[test]
fn test_list_nullability_matrix() {
    let fx = Fixture::new("{ matrix { a b c d } }");
    let avoid = ShapeOptions {
        skip_typename: true,
        avoid_optionals: true,
        ..ShapeOptions::default()
    };

    assert_eq!(
        fx.pre_resolved("Matrix", &["matrix"], avoid),
        "{ a: Array<string | null> | null; b: Array<string | null>; \
         c: Array<string> | null; d: Array<string> }"
    );
    assert_eq!(
        fx.pre_resolved("Matrix", &["matrix"], skip_typename()),
        "{ a?: Array<string | null>; b: Array<string | null>; \
         c?: Array<string>; d: Array<string> }"
    );

    let flow = fx
        .resolve("Matrix", &["matrix"], &PreResolvedProcessor, &Flow::default(), avoid)
        .unwrap();
    assert_eq!(
        flow,
        "{| a: ?Array<?string>, b: Array<?string>, c: ?Array<string>, d: Array<string> |}"
    );
}

#[test]
fn test_fragment_and_local_fields_merge() {
    let fx = Fixture::new(
        "query { user { ...UserFields id nick: name } }
         fragment UserFields on User { id name nick: id }",
    );
    assert_eq!(
        fx.pick("User", &["user"], skip_typename()),
        "Pick<User, 'id' | 'name'> & { nick?: User['name'] }"
    );
    assert_eq!(
        fx.pre_resolved("User", &["user"], skip_typename()),
        "{ id: string; name?: string; nick?: string }"
    );
}

#[test]
fn test_repeated_link_fields_merge() {
    let fx = Fixture::new("{ user { id } user { name } }");
    assert_eq!(
        fx.pick("Query", &[], skip_typename()),
        "{ user?: Maybe<Pick<User, 'id' | 'name'>> }"
    );
}

#[test]
fn test_interface_narrowing_yields_union() {
    let fx = Fixture::new(
        r#"{ node(id: "1") { id ... on User { name } ... on Post { title } } }"#,
    );
    assert_eq!(
        fx.pick("Node", &["node"], ShapeOptions::default()),
        "({ __typename?: 'User' } & Pick<User, 'id' | 'name'> | \
         { __typename?: 'Post' } & Pick<Post, 'id' | 'title'>)"
    );

    let fx = Fixture::new(
        r#"{ node(id: "1") { __typename id ... on User { name } ... on Post { title } } }"#,
    );
    assert_eq!(
        fx.pre_resolved("Node", &["node"], ShapeOptions::default()),
        "({ __typename: 'User'; id: string; name?: string } | \
         { __typename: 'Post'; id: string; title: string })"
    );
}

#[test]
fn test_interface_without_narrowing() {
    let fx = Fixture::new(r#"{ node(id: "1") { id } }"#);
    assert_eq!(
        fx.pick("Node", &["node"], ShapeOptions::default()),
        "{ __typename?: 'User' | 'Post' } & Pick<Node, 'id'>"
    );

    let fx = Fixture::new(
        r#"query { node(id: "1") { ...NodeFields } }
           fragment NodeFields on Node { id }"#,
    );
    assert_eq!(
        fx.pick("Node", &["node"], ShapeOptions::default()),
        "{ __typename?: 'User' | 'Post' } & Pick<Node, 'id'>"
    );
}

#[test]
fn test_union_members_with_enums() {
    let fx = Fixture::new("{ search { ... on User { role } ... on Post { title } } }");
    assert_eq!(
        fx.pre_resolved("Query", &[], skip_typename()),
        "{ search: Array<({ role: 'ADMIN' | 'MEMBER' } | { title: string })> }"
    );
}

#[test]
fn test_nested_list_of_objects() {
    let fx = Fixture::new("{ user { friends { id } } }");
    assert_eq!(
        fx.pre_resolved("User", &["user"], skip_typename()),
        "{ friends: Array<{ id: string }> }"
    );
}

#[test]
fn test_pick_and_pre_resolved_name_the_same_fields() {
    let fx = Fixture::new("{ user { __typename id name nick: name role } }");
    let pick = fx.pick("User", &["user"], ShapeOptions::default());
    let pre = fx.pre_resolved("User", &["user"], ShapeOptions::default());
    assert_eq!(
        pick,
        "{ __typename: 'User' } & Pick<User, 'id' | 'name' | 'role'> & { nick?: User['name'] }"
    );
    assert_eq!(field_names(&pick), field_names(&pre));
    assert_eq!(
        field_names(&pre).into_iter().collect::<Vec<_>>(),
        ["__typename", "id", "name", "nick", "role"]
    );
}

#[test]
fn test_flow_pick() {
    let fx = Fixture::new("{ user { id name } }");
    let out = fx
        .resolve("Query", &[], &PickProcessor, &Flow::default(), skip_typename())
        .unwrap();
    assert_eq!(out, "{| user?: ?$Pick<User, {| id: *, name: * |}> |}");
}

#[test]
fn test_flow_pick_with_typename_spreads_parts() {
    let fx = Fixture::new("{ user { id } }");
    let out = fx
        .resolve("Query", &[], &PickProcessor, &Flow::default(), ShapeOptions::default())
        .unwrap();
    assert_eq!(
        out,
        "{| ...{| __typename?: 'Query' |}, \
         ...{| user?: ?{| ...{| __typename?: 'User' |}, ...$Pick<User, {| id: * |}> |} |} |}"
    );
    assert!(!out.contains(" & "));
}

#[test]
fn test_local_alias_beats_nested_fragment_alias() {
    let fragment = "fragment Q on Query { user { nick: id } }";
    for query in [
        format!("query {{ ...Q user {{ nick: name }} }} {fragment}"),
        format!("query {{ user {{ nick: name }} ...Q }} {fragment}"),
    ] {
        let fx = Fixture::new(&query);
        assert_eq!(
            fx.pick("Query", &[], skip_typename()),
            "{ user?: Maybe<{ nick?: User['name'] }> }"
        );
    }
}

#[test]
fn test_visited_types_include_nested_shapes() {
    let fx = Fixture::new("{ user { friends { id } } search { ... on Post { title } } }");
    let scalars = ScalarMap::typescript();
    let names = TypeNames::default();
    let dialect = TypeScript::default();
    let env = ShapeEnv {
        schema: &fx.schema,
        dialect: &dialect,
        scalars: &scalars,
        names: &names,
        options: skip_typename(),
    };
    let resolver = ShapeResolver::new(env, &fx.fragments, &PickProcessor);
    resolver.resolve("Query", fx.selection(&[])).unwrap();
    assert_eq!(resolver.visited_types(), ["Query", "User", "Post"]);
}

#[test]
fn test_name_converter_applies_to_references() {
    let fx = Fixture::new("{ user { id } }");
    let scalars = ScalarMap::typescript();
    let names = TypeNames::new("", "Type");
    let dialect = TypeScript::default();
    let env = ShapeEnv {
        schema: &fx.schema,
        dialect: &dialect,
        scalars: &scalars,
        names: &names,
        options: skip_typename(),
    };
    let out = ShapeResolver::new(env, &fx.fragments, &PickProcessor)
        .resolve("User", fx.selection(&["user"]))
        .unwrap();
    assert_eq!(out, "Pick<UserType, 'id'>");
}

#[test]
fn test_unknown_field_and_fragment() {
    let fx = Fixture::new("{ user { age } }");
    let err = fx
        .resolve("User", &["user"], &PickProcessor, &TypeScript::default(), skip_typename())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField { field, .. } if field == "age"));

    let fx = Fixture::new("{ user { ...Missing } }");
    let err = fx
        .resolve("User", &["user"], &PickProcessor, &TypeScript::default(), skip_typename())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownFragment { name } if name == "Missing"));
}

#[test]
fn test_cyclic_fragments_rejected() {
    let source = Source::parse(
        "q.graphql",
        "fragment A on User { friends { ...B } }
         fragment B on User { ...A }",
    )
    .unwrap();
    let err = FragmentRegistry::build(&[source], &[]).unwrap_err();
    assert!(matches!(err, Error::CyclicFragment { path } if path == ["A", "B", "A"]));
}
