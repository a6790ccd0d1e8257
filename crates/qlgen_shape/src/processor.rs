//! The strategy interface that turns a flattened selection into a type.

use crate::dialect::Dialect;
use crate::naming::NameConverter;
use crate::scalars::ScalarResolver;
use qlgen_schema::{FieldDef, Schema, TypeRef};

/// Resolution flags shared by every strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Do not add `__typename` unless it is selected.
    pub skip_typename: bool,
    /// Make the implicit `__typename` required.
    pub non_optional_typename: bool,
    /// Never mark keys optional, even for nullable fields.
    pub avoid_optionals: bool,
}

/// Capabilities a processor renders with.
#[derive(Clone, Copy)]
pub struct ShapeEnv<'a> {
    pub schema: &'a Schema,
    pub dialect: &'a dyn Dialect,
    pub scalars: &'a dyn ScalarResolver,
    pub names: &'a dyn NameConverter,
    pub options: ShapeOptions,
}

impl ShapeEnv<'_> {
    /// True when a field of type `ty` gets an optional key.
    #[must_use]
    pub fn is_optional(&self, ty: &TypeRef) -> bool {
        ty.is_nullable() && !self.options.avoid_optionals
    }
}

/// One field of a flattened selection, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedField<'a> {
    /// The `__typename` discriminant, already rendered as a literal type.
    Typename {
        key: String,
        literal: String,
        optional: bool,
    },
    /// A scalar or enum field. Aliased when `key` differs from the field name.
    Leaf { key: String, field: &'a FieldDef },
    /// An object-valued field; `shape` is the unwrapped nested shape.
    Link {
        key: String,
        field: &'a FieldDef,
        shape: String,
    },
}

impl SelectedField<'_> {
    /// The response key.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Typename { key, .. } | Self::Leaf { key, .. } | Self::Link { key, .. } => key,
        }
    }

    #[must_use]
    pub fn is_aliased(&self) -> bool {
        match self {
            Self::Typename { key, .. } => key != "__typename",
            Self::Leaf { key, field } | Self::Link { key, field, .. } => *key != field.name,
        }
    }
}

/// The flattened selection for one possible concrete type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteShape<'a> {
    /// Schema name of the concrete type (an interface when not narrowed).
    pub type_name: String,
    pub fields: Vec<SelectedField<'a>>,
}

impl ConcreteShape<'_> {
    /// Response keys in selection order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(SelectedField::key)
    }
}

/// Renders a [`ConcreteShape`] into a type expression.
pub trait SelectionSetProcessor: Send + Sync {
    fn render(&self, shape: &ConcreteShape<'_>, env: &ShapeEnv<'_>) -> String;
}
