//! Owned schema model.

use crate::wrapping::TypeRef;
use indexmap::IndexMap;

/// The kind of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    /// The introspection name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::InputObject => "INPUT_OBJECT",
        }
    }

    /// Scalars and enums end a selection.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Scalar | Self::Enum)
    }

    /// Interfaces and unions.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::Interface | Self::Union)
    }

    /// Types that can carry a selection set.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }
}

/// A directive applied to a schema element, arguments printed as GraphQL.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveUse {
    pub name: String,
    pub arguments: Vec<(String, String)>,
}

impl DirectiveUse {
    /// Returns the printed value of an argument.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value.as_str())
    }
}

/// `@deprecated` state of a field or enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub reason: Option<String>,
}

/// An argument or input field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// Default value printed as GraphQL.
    pub default_value: Option<String>,
    pub directives: Vec<DirectiveUse>,
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: Vec<InputValueDef>,
    pub directives: Vec<DirectiveUse>,
    pub deprecation: Option<Deprecation>,
}

impl FieldDef {
    #[must_use]
    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }
}

/// A value of an enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<Deprecation>,
}

/// A named type of the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// Output fields (objects and interfaces).
    pub fields: IndexMap<String, FieldDef>,
    /// Input fields (input objects).
    pub input_fields: IndexMap<String, InputValueDef>,
    /// Implemented interfaces (objects and interfaces).
    pub interfaces: Vec<String>,
    /// Member types (unions).
    pub members: Vec<String>,
    /// Values (enums).
    pub enum_values: Vec<EnumValueDef>,
    pub directives: Vec<DirectiveUse>,
    /// True for the five scalars every schema has.
    pub builtin: bool,
}

impl TypeDef {
    /// Creates an empty type of the given kind.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            fields: IndexMap::new(),
            input_fields: IndexMap::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            enum_values: Vec::new(),
            directives: Vec::new(),
            builtin: false,
        }
    }

    /// Looks up an output field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }
}

/// A custom directive definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDef {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDef>,
    pub locations: Vec<String>,
}

/// Root operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// The suffix used for generated operation type names.
    #[must_use]
    pub const fn type_suffix(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }

    /// The GraphQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}
