//! Structural-pick rendering: references into the schema types.

use crate::dialect::ObjectField;
use crate::processor::{ConcreteShape, SelectedField, SelectionSetProcessor, ShapeEnv};

/// Emits `Pick<User, 'id' | 'name'>` for plain leaf fields, property
/// lookups for aliases and object literals for `__typename` and links, all
/// joined as an intersection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickProcessor;

impl SelectionSetProcessor for PickProcessor {
    fn render(&self, shape: &ConcreteShape<'_>, env: &ShapeEnv<'_>) -> String {
        let dialect = env.dialect;
        let type_name = env.names.convert(&shape.type_name);

        let mut typename = Vec::new();
        let mut primitives = Vec::new();
        let mut aliased = Vec::new();
        let mut links = Vec::new();

        for field in &shape.fields {
            match field {
                SelectedField::Typename {
                    key,
                    literal,
                    optional,
                } => typename.push(ObjectField::new(key.as_str(), literal.as_str(), *optional)),
                SelectedField::Leaf { key, field: def } if *key == def.name => {
                    primitives.push(def.name.as_str());
                }
                SelectedField::Leaf { key, field: def } => aliased.push(ObjectField::new(
                    key.as_str(),
                    dialect.property_type(&type_name, &def.name),
                    env.is_optional(&def.ty),
                )),
                SelectedField::Link {
                    key,
                    field: def,
                    shape,
                } => links.push(ObjectField::new(
                    key.as_str(),
                    def.ty.encode(shape.clone(), dialect),
                    env.is_optional(&def.ty),
                )),
            }
        }

        let mut parts = Vec::new();
        if !typename.is_empty() {
            parts.push(dialect.object(&typename));
        }
        if !primitives.is_empty() {
            parts.push(dialect.pick(&type_name, &primitives));
        }
        if !aliased.is_empty() {
            parts.push(dialect.object(&aliased));
        }
        if !links.is_empty() {
            parts.push(dialect.object(&links));
        }
        dialect.intersection(parts)
    }
}
