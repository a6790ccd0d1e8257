//! Pre-resolved rendering: one self-contained object literal per shape.

use crate::dialect::ObjectField;
use crate::processor::{ConcreteShape, SelectedField, SelectionSetProcessor, ShapeEnv};
use qlgen_schema::{TypeKind, TypeRef};

/// Inlines every field's concrete type. Scalars go through the scalar
/// resolver and enums become unions of their values as string literals, so
/// the output never names a schema-derived type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreResolvedProcessor;

impl PreResolvedProcessor {
    fn leaf_type(env: &ShapeEnv<'_>, name: &str) -> String {
        match env.schema.type_def(name) {
            Some(def) if def.kind == TypeKind::Enum && !def.enum_values.is_empty() => def
                .enum_values
                .iter()
                .map(|v| env.dialect.string_literal(&v.name))
                .collect::<Vec<_>>()
                .join(" | "),
            _ => env.scalars.resolve_or_fallback(name).to_string(),
        }
    }

    fn property(env: &ShapeEnv<'_>, key: &str, ty: &TypeRef, base: String) -> ObjectField {
        let optional = env.is_optional(ty);
        let rendered = if optional && env.dialect.optional_key_admits_null() {
            ty.wrapping.encode_inner(base, env.dialect)
        } else {
            ty.encode(base, env.dialect)
        };
        ObjectField::new(key, rendered, optional)
    }
}

impl SelectionSetProcessor for PreResolvedProcessor {
    fn render(&self, shape: &ConcreteShape<'_>, env: &ShapeEnv<'_>) -> String {
        let fields: Vec<ObjectField> = shape
            .fields
            .iter()
            .map(|field| match field {
                SelectedField::Typename {
                    key,
                    literal,
                    optional,
                } => ObjectField::new(key.as_str(), literal.as_str(), *optional),
                SelectedField::Leaf { key, field: def } => {
                    Self::property(env, key, &def.ty, Self::leaf_type(env, &def.ty.name))
                }
                SelectedField::Link {
                    key,
                    field: def,
                    shape,
                } => Self::property(env, key, &def.ty, shape.clone()),
            })
            .collect();
        env.dialect.object(&fields)
    }
}
