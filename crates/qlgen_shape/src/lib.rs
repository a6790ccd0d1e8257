//! Selection-set shape resolution for qlgen.
//!
//! Given a parent type and a selection set, [`ShapeResolver`] computes the
//! type of the response: one flattened shape per possible concrete type,
//! rendered by a [`SelectionSetProcessor`] strategy and joined as a union.
//!
//! Two strategies are provided:
//! - [`PickProcessor`] references the schema types (`Pick<User, 'id'>`)
//! - [`PreResolvedProcessor`] inlines every field type
//!
//! Target syntax comes from a [`Dialect`] ([`TypeScript`] or [`Flow`]).
//!
//! # Example
//!
//! ```ignore
//! let env = ShapeEnv {
//!     schema: &schema,
//!     dialect: &TypeScript::default(),
//!     scalars: &ScalarMap::typescript(),
//!     names: &TypeNames::default(),
//!     options: ShapeOptions::default(),
//! };
//! let resolver = ShapeResolver::new(env, &fragments, &PickProcessor);
//! let ty = resolver.resolve("Query", operation.selection_set)?;
//! ```

pub mod dialect;
pub mod naming;
pub mod pick;
pub mod pre_resolved;
pub mod processor;
pub mod resolver;
pub mod scalars;

pub use dialect::{Dialect, Flow, NullableStyle, ObjectField, TypeScript};
pub use naming::{NameConverter, TypeNames};
pub use pick::PickProcessor;
pub use pre_resolved::PreResolvedProcessor;
pub use processor::{ConcreteShape, SelectedField, SelectionSetProcessor, ShapeEnv, ShapeOptions};
pub use resolver::ShapeResolver;
pub use scalars::{ScalarMap, ScalarResolver};
