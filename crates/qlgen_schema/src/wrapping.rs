//! List and non-null wrapping of GraphQL type references.
//!
//! A GraphQL type such as `[[String!]]!` is stored as its named type plus a
//! [`Wrapping`]: whether the named type itself is non-null, and one entry per
//! list level ordered innermost-first. Encoding always walks from the named
//! type outwards, so every target gets the same four-state matrix:
//!
//! | GraphQL   | meaning                               |
//! |-----------|---------------------------------------|
//! | `[T]`     | nullable list of nullable `T`         |
//! | `[T]!`    | non-null list of nullable `T`         |
//! | `[T!]`    | nullable list of non-null `T`         |
//! | `[T!]!`   | non-null list of non-null `T`         |

use graphql_parser::schema::Type;

/// Per-target encoding of lists and nullability.
pub trait WrappingEncoder {
    /// Wraps an item type in the target's list type.
    fn list(&self, item: String) -> String;

    /// Marks a type as nullable.
    fn nullable(&self, ty: String) -> String;

    /// Marks a type as non-null. Most targets leave it untouched.
    fn required(&self, ty: String) -> String {
        ty
    }
}

/// Wrappers around a named type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Wrapping {
    inner_required: bool,
    /// `true` for a non-null list, innermost list first.
    lists: Vec<bool>,
}

impl Wrapping {
    /// A nullable, non-list type.
    #[must_use]
    pub fn nullable() -> Self {
        Self::default()
    }

    /// A non-null, non-list type.
    #[must_use]
    pub fn required() -> Self {
        Self {
            inner_required: true,
            lists: Vec::new(),
        }
    }

    /// Adds an outer list level.
    #[must_use]
    pub fn wrap_list(mut self, required: bool) -> Self {
        self.lists.push(required);
        self
    }

    /// True when the named type itself is non-null.
    #[must_use]
    pub fn is_inner_required(&self) -> bool {
        self.inner_required
    }

    /// Number of list levels.
    #[must_use]
    pub fn list_depth(&self) -> usize {
        self.lists.len()
    }

    /// True when the outermost type is non-null.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.lists.last().copied().unwrap_or(self.inner_required)
    }

    /// True when the outermost type may be null.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        !self.is_required()
    }

    /// Applies the wrappers to `base`, innermost first.
    pub fn encode(&self, base: String, encoder: &(impl WrappingEncoder + ?Sized)) -> String {
        let mut ty = apply_nullability(base, self.inner_required, encoder);
        for &required in &self.lists {
            ty = apply_nullability(encoder.list(ty), required, encoder);
        }
        ty
    }

    /// Applies the wrappers but leaves the outermost level non-null.
    ///
    /// Used where the target expresses outer nullability on the key instead
    /// of on the type, e.g. TypeScript's `name?:`.
    pub fn encode_inner(
        &self,
        base: String,
        encoder: &(impl WrappingEncoder + ?Sized),
    ) -> String {
        let mut stripped = self.clone();
        match stripped.lists.last_mut() {
            Some(outer) => *outer = true,
            None => stripped.inner_required = true,
        }
        stripped.encode(base, encoder)
    }
}

fn apply_nullability(
    ty: String,
    required: bool,
    encoder: &(impl WrappingEncoder + ?Sized),
) -> String {
    if required {
        encoder.required(ty)
    } else {
        encoder.nullable(ty)
    }
}

/// A named type with its wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub wrapping: Wrapping,
}

impl TypeRef {
    /// Creates a reference to `name` with the given wrapping.
    pub fn new(name: impl Into<String>, wrapping: Wrapping) -> Self {
        Self {
            name: name.into(),
            wrapping,
        }
    }

    /// Converts a parsed GraphQL type.
    #[must_use]
    pub fn from_ast(ty: &Type<'_, String>) -> Self {
        // Collect wrappers outermost-first, then reverse.
        let mut levels = Vec::new();
        let mut required = false;
        let mut current = ty;
        let name = loop {
            match current {
                Type::NonNullType(inner) => {
                    required = true;
                    current = inner;
                }
                Type::ListType(inner) => {
                    levels.push(required);
                    required = false;
                    current = inner;
                }
                Type::NamedType(name) => break name.clone(),
            }
        };
        levels.reverse();
        Self {
            name,
            wrapping: Wrapping {
                inner_required: required,
                lists: levels,
            },
        }
    }

    /// Encodes the reference using `base` as the rendered named type.
    pub fn encode(&self, base: String, encoder: &(impl WrappingEncoder + ?Sized)) -> String {
        self.wrapping.encode(base, encoder)
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.wrapping.is_nullable()
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.wrapping.list_depth() > 0
    }
}

impl std::fmt::Display for TypeRef {
    /// Prints the reference back in GraphQL syntax.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        struct Sdl;
        impl WrappingEncoder for Sdl {
            fn list(&self, item: String) -> String {
                format!("[{item}]")
            }
            fn nullable(&self, ty: String) -> String {
                ty
            }
            fn required(&self, ty: String) -> String {
                format!("{ty}!")
            }
        }
        f.write_str(&self.encode(self.name.clone(), &Sdl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_parser::parse_schema;

    struct Ts;

    impl WrappingEncoder for Ts {
        fn list(&self, item: String) -> String {
            format!("Array<{item}>")
        }
        fn nullable(&self, ty: String) -> String {
            format!("Maybe<{ty}>")
        }
    }

    fn field_type(sdl_type: &str) -> TypeRef {
        let sdl = format!("type T {{ f: {sdl_type} }}");
        let doc = parse_schema::<String>(&sdl).unwrap();
        match &doc.definitions[0] {
            graphql_parser::schema::Definition::TypeDefinition(
                graphql_parser::schema::TypeDefinition::Object(obj),
            ) => TypeRef::from_ast(&obj.fields[0].field_type),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_four_state_matrix() {
        let cases = [
            ("[String]", "Maybe<Array<Maybe<string>>>"),
            ("[String]!", "Array<Maybe<string>>"),
            ("[String!]", "Maybe<Array<string>>"),
            ("[String!]!", "Array<string>"),
        ];
        for (sdl, expected) in cases {
            let ty = field_type(sdl);
            assert_eq!(ty.encode("string".into(), &Ts), expected, "{sdl}");
        }
    }

    #[test]
    fn test_nested_lists() {
        let ty = field_type("[[Int!]]!");
        assert_eq!(ty.wrapping.list_depth(), 2);
        assert!(ty.wrapping.is_inner_required());
        assert!(!ty.is_nullable());
        assert_eq!(
            ty.encode("number".into(), &Ts),
            "Array<Maybe<Array<number>>>"
        );
    }

    #[test]
    fn test_encode_inner_strips_outer_nullability() {
        assert_eq!(
            field_type("[String]").wrapping.encode_inner("string".into(), &Ts),
            "Array<Maybe<string>>"
        );
        assert_eq!(
            field_type("String").wrapping.encode_inner("string".into(), &Ts),
            "string"
        );
    }

    #[test]
    fn test_display_round_trips_sdl() {
        for sdl in ["String", "String!", "[String]", "[String!]!", "[[ID]!]"] {
            assert_eq!(field_type(sdl).to_string(), sdl);
        }
    }
}
