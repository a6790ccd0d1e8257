//! Schema and document model for qlgen.
//!
//! This crate provides:
//! - `schema`: an indexed view over a parsed SDL document
//! - `types`: the owned type model the index is built from
//! - `wrapping`: list and non-null wrappers shared by every target
//! - `documents`: executable documents and the fragment registry

pub mod documents;
pub mod schema;
pub mod types;
pub mod wrapping;

pub use documents::{
    collect_spreads, type_condition, FragmentDefinition, FragmentEntry, FragmentRegistry,
    Operation, QueryDocument, Selection, SelectionSet, Source, VariableDefinition,
};
pub use schema::{print_value, Schema, SchemaDocument, BUILTIN_SCALARS};
pub use types::{
    Deprecation, DirectiveDef, DirectiveUse, EnumValueDef, FieldDef, InputValueDef,
    OperationKind, TypeDef, TypeKind,
};
pub use wrapping::{TypeRef, Wrapping, WrappingEncoder};
