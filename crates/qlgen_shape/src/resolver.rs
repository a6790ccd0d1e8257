//! Selection-set flattening and per-concrete-type shape resolution.

use crate::processor::{ConcreteShape, SelectedField, SelectionSetProcessor, ShapeEnv};
use graphql_parser::query::TypeCondition;
use indexmap::{IndexMap, IndexSet};
use qlgen_core::{Error, Result};
use qlgen_schema::documents::{FragmentEntry, FragmentRegistry, Selection, SelectionSet};
use qlgen_schema::{FieldDef, TypeKind};
use std::cell::RefCell;

/// Where a flattened field came from. Local selections win key collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Local,
    Fragment,
}

/// A selection set together with the origin of the selection that
/// contributed it.
type Tagged<'d> = (&'d SelectionSet, Origin);

fn local<'d>(sets: &[&'d SelectionSet]) -> Vec<Tagged<'d>> {
    sets.iter().map(|&set| (set, Origin::Local)).collect()
}

enum Collected<'d> {
    Typename,
    Leaf(&'d FieldDef),
    Link {
        field: &'d FieldDef,
        sets: Vec<Tagged<'d>>,
    },
}

struct Entry<'d> {
    origin: Origin,
    value: Collected<'d>,
}

fn insert<'d>(
    out: &mut IndexMap<String, Entry<'d>>,
    key: String,
    origin: Origin,
    value: Collected<'d>,
) {
    let Some(existing) = out.get_mut(&key) else {
        out.insert(key, Entry { origin, value });
        return;
    };

    // Two selections of the same object field merge their sub-selections.
    if let (
        Collected::Link {
            field: current,
            sets: current_sets,
        },
        Collected::Link { field, sets },
    ) = (&mut existing.value, &value)
    {
        if current.name == field.name {
            current_sets.extend(sets.iter().copied());
            if origin == Origin::Local {
                existing.origin = Origin::Local;
            }
            return;
        }
    }

    if existing.origin == Origin::Fragment && origin == Origin::Local {
        *existing = Entry { origin, value };
    }
}

/// Resolves selection sets into target type expressions.
///
/// For every possible concrete type of the parent the selections are
/// flattened (inline fragments and fragment spreads that apply to the type
/// are inlined at the same level, fields keyed by response key) and handed
/// to the configured [`SelectionSetProcessor`]. Several concrete types
/// produce a parenthesised union.
pub struct ShapeResolver<'a> {
    env: ShapeEnv<'a>,
    fragments: &'a FragmentRegistry,
    processor: &'a dyn SelectionSetProcessor,
    visited: RefCell<IndexSet<String>>,
}

impl<'a> ShapeResolver<'a> {
    pub fn new(
        env: ShapeEnv<'a>,
        fragments: &'a FragmentRegistry,
        processor: &'a dyn SelectionSetProcessor,
    ) -> Self {
        Self {
            env,
            fragments,
            processor,
            visited: RefCell::default(),
        }
    }

    /// Every concrete type a shape has been built for so far, nested
    /// selections included, in first-seen order.
    #[must_use]
    pub fn visited_types(&self) -> Vec<String> {
        self.visited.borrow().iter().cloned().collect()
    }

    /// Resolves one selection set on `parent`.
    pub fn resolve(&self, parent: &str, selection_set: &SelectionSet) -> Result<String> {
        self.resolve_sets(parent, &[selection_set])
    }

    /// Resolves several selection sets on `parent` as if they were one.
    pub fn resolve_sets<'d>(&'d self, parent: &str, sets: &[&'d SelectionSet]) -> Result<String> {
        self.resolve_tagged(parent, &local(sets))
    }

    fn resolve_tagged<'d>(&'d self, parent: &str, sets: &[Tagged<'d>]) -> Result<String> {
        let shapes = self.tagged_shapes(parent, sets)?;
        tracing::trace!(parent, shapes = shapes.len(), "resolved selection set");
        let rendered = shapes
            .iter()
            .map(|shape| self.processor.render(shape, &self.env))
            .collect();
        Ok(self.env.dialect.union(rendered))
    }

    /// The flattened selection for every possible concrete type of `parent`.
    pub fn concrete_shapes<'d>(
        &'d self,
        parent: &str,
        sets: &[&'d SelectionSet],
    ) -> Result<Vec<ConcreteShape<'d>>> {
        self.tagged_shapes(parent, &local(sets))
    }

    fn tagged_shapes<'d>(
        &'d self,
        parent: &str,
        sets: &[Tagged<'d>],
    ) -> Result<Vec<ConcreteShape<'d>>> {
        let plain: Vec<&SelectionSet> = sets.iter().map(|&(set, _)| set).collect();
        self.concrete_types(parent, &plain)?
            .into_iter()
            .map(|concrete| self.shape_for(&concrete, sets))
            .collect()
    }

    fn concrete_types<'d>(&'d self, parent: &str, sets: &[&'d SelectionSet]) -> Result<Vec<String>> {
        let schema = self.env.schema;
        let def = schema.expect_type(parent)?;
        let owned = |names: Vec<&str>| -> Vec<String> {
            names.into_iter().map(str::to_string).collect()
        };
        match def.kind {
            TypeKind::Object => Ok(vec![def.name.clone()]),
            TypeKind::Union => Ok(owned(schema.possible_types(parent))),
            TypeKind::Interface => {
                let possible = schema.possible_types(parent);
                if !possible.is_empty() && self.narrows(parent, sets, &mut Vec::new())? {
                    Ok(owned(possible))
                } else {
                    Ok(vec![def.name.clone()])
                }
            }
            _ => Err(Error::custom(format!(
                "cannot select fields on {} type `{parent}`",
                def.kind.as_str().to_lowercase().replace('_', " ")
            ))),
        }
    }

    /// True when some inline fragment or spread at this level has a type
    /// condition other than `parent`.
    fn narrows<'d>(
        &'d self,
        parent: &str,
        sets: &[&'d SelectionSet],
        stack: &mut Vec<&'d str>,
    ) -> Result<bool> {
        for &set in sets {
            for item in &set.items {
                match item {
                    Selection::Field(_) => {}
                    Selection::InlineFragment(inline) => {
                        if let Some(TypeCondition::On(condition)) = &inline.type_condition {
                            if condition != parent {
                                return Ok(true);
                            }
                        }
                        if self.narrows(parent, &[&inline.selection_set], stack)? {
                            return Ok(true);
                        }
                    }
                    Selection::FragmentSpread(spread) => {
                        let entry = self.enter(&spread.fragment_name, stack)?;
                        let narrowed = entry.type_condition != parent
                            || self.narrows(parent, &[entry.selection_set()], stack)?;
                        stack.pop();
                        if narrowed {
                            return Ok(true);
                        }
                    }
                }
            }
        }
        Ok(false)
    }

    fn shape_for<'d>(&'d self, concrete: &str, sets: &[Tagged<'d>]) -> Result<ConcreteShape<'d>> {
        self.visited.borrow_mut().insert(concrete.to_string());
        let mut collected = IndexMap::new();
        self.collect(concrete, sets, &mut collected, &mut Vec::new())?;

        let literal = self.typename_literal(concrete);
        let mut fields = Vec::with_capacity(collected.len() + 1);
        let selected_typename = collected
            .values()
            .any(|entry| matches!(entry.value, Collected::Typename));
        if !selected_typename && !self.env.options.skip_typename {
            fields.push(SelectedField::Typename {
                key: "__typename".to_string(),
                literal: literal.clone(),
                optional: !self.env.options.non_optional_typename,
            });
        }

        for (key, entry) in collected {
            fields.push(match entry.value {
                Collected::Typename => SelectedField::Typename {
                    key,
                    literal: literal.clone(),
                    optional: false,
                },
                Collected::Leaf(field) => SelectedField::Leaf { key, field },
                Collected::Link { field, sets } => SelectedField::Link {
                    shape: self.resolve_tagged(&field.ty.name, &sets)?,
                    key,
                    field,
                },
            });
        }

        Ok(ConcreteShape {
            type_name: concrete.to_string(),
            fields,
        })
    }

    /// Flattens `sets` into `out`. Each set carries its own origin, so
    /// sub-selections merged from a fragment still lose to local ones.
    fn collect<'d>(
        &'d self,
        concrete: &str,
        sets: &[Tagged<'d>],
        out: &mut IndexMap<String, Entry<'d>>,
        stack: &mut Vec<&'d str>,
    ) -> Result<()> {
        let schema = self.env.schema;
        for &(set, origin) in sets {
            for item in &set.items {
                match item {
                    Selection::Field(field) => {
                        let key = field.alias.as_ref().unwrap_or(&field.name).clone();
                        let value = if field.name == "__typename" {
                            Collected::Typename
                        } else {
                            let def = schema.field(concrete, &field.name)?;
                            if schema.is_leaf(&def.ty.name) {
                                Collected::Leaf(def)
                            } else {
                                Collected::Link {
                                    field: def,
                                    sets: vec![(&field.selection_set, origin)],
                                }
                            }
                        };
                        insert(out, key, origin, value);
                    }
                    Selection::InlineFragment(inline) => {
                        let applies = match &inline.type_condition {
                            None => true,
                            Some(TypeCondition::On(condition)) => self.applies(concrete, condition),
                        };
                        if applies {
                            self.collect(concrete, &[(&inline.selection_set, origin)], out, stack)?;
                        }
                    }
                    Selection::FragmentSpread(spread) => {
                        let entry = self.enter(&spread.fragment_name, stack)?;
                        if self.applies(concrete, &entry.type_condition) {
                            self.collect(
                                concrete,
                                &[(entry.selection_set(), Origin::Fragment)],
                                out,
                                stack,
                            )?;
                        }
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    /// Pushes `name` onto the expansion stack, rejecting re-entry.
    fn enter<'d>(&'d self, name: &'d str, stack: &mut Vec<&'d str>) -> Result<&'d FragmentEntry> {
        if let Some(start) = stack.iter().position(|n| *n == name) {
            let mut path: Vec<String> = stack[start..].iter().map(ToString::to_string).collect();
            path.push(name.to_string());
            return Err(Error::CyclicFragment { path });
        }
        let entry = self.fragments.expect(name)?;
        stack.push(name);
        Ok(entry)
    }

    fn applies(&self, concrete: &str, condition: &str) -> bool {
        let schema = self.env.schema;
        schema.satisfies(concrete, condition) || schema.possible_types(condition).contains(&concrete)
    }

    fn typename_literal(&self, concrete: &str) -> String {
        let schema = self.env.schema;
        let dialect = self.env.dialect;
        let is_interface = schema
            .type_def(concrete)
            .is_some_and(|def| def.kind == TypeKind::Interface);
        let possible = if is_interface {
            schema.possible_types(concrete)
        } else {
            Vec::new()
        };
        if possible.is_empty() {
            dialect.string_literal(concrete)
        } else {
            possible
                .into_iter()
                .map(|name| dialect.string_literal(name))
                .collect::<Vec<_>>()
                .join(" | ")
        }
    }
}
