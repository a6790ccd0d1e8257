//! Indexed, immutable view over a parsed SDL document.

use crate::types::{
    Deprecation, DirectiveDef, DirectiveUse, EnumValueDef, FieldDef, InputValueDef, OperationKind,
    TypeDef, TypeKind,
};
use crate::wrapping::TypeRef;
use graphql_parser::schema::{self as ast, Definition, TypeDefinition, TypeExtension};
use indexmap::IndexMap;
use qlgen_core::{Error, Result};
use rustc_hash::FxHashMap;

/// Parsed schema document with owned strings.
pub type SchemaDocument = ast::Document<'static, String>;

/// Built-in scalars in the order they are emitted.
pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Boolean", "Int", "Float"];

/// The schema every plugin reads from.
#[derive(Debug, Clone)]
pub struct Schema {
    document: SchemaDocument,
    types: IndexMap<String, TypeDef>,
    directives: IndexMap<String, DirectiveDef>,
    roots: FxHashMap<OperationKind, String>,
    implementors: FxHashMap<String, Vec<String>>,
}

impl Schema {
    /// Parses and indexes an SDL string.
    pub fn parse(sdl: &str) -> Result<Self> {
        let document = ast::parse_schema::<String>(sdl)
            .map_err(|e| Error::SchemaParse {
                message: e.to_string(),
            })?
            .into_static();
        Self::from_document(document)
    }

    /// Parses an SDL string after appending extension SDL, e.g. directive
    /// definitions contributed by plugins.
    pub fn parse_with_extensions(sdl: &str, extensions: &[String]) -> Result<Self> {
        if extensions.is_empty() {
            return Self::parse(sdl);
        }
        let mut merged = String::with_capacity(sdl.len());
        merged.push_str(sdl);
        for extension in extensions {
            merged.push('\n');
            merged.push_str(extension);
        }
        Self::parse(&merged)
    }

    /// Indexes an already parsed document.
    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let mut builder = Builder::default();
        for scalar in BUILTIN_SCALARS {
            let mut def = TypeDef::new(scalar, TypeKind::Scalar);
            def.builtin = true;
            builder.types.insert(scalar.to_string(), def);
        }

        for definition in &document.definitions {
            match definition {
                Definition::TypeDefinition(ty) => builder.add_type(ty)?,
                Definition::DirectiveDefinition(directive) => builder.add_directive(directive),
                Definition::SchemaDefinition(schema) => {
                    let roots = [
                        (OperationKind::Query, &schema.query),
                        (OperationKind::Mutation, &schema.mutation),
                        (OperationKind::Subscription, &schema.subscription),
                    ];
                    for (kind, name) in roots {
                        if let Some(name) = name {
                            builder.roots.insert(kind, name.clone());
                        }
                    }
                }
                Definition::TypeExtension(_) => {}
            }
        }
        for definition in &document.definitions {
            if let Definition::TypeExtension(extension) = definition {
                builder.extend_type(extension)?;
            }
        }

        builder.finish(document)
    }

    /// The parsed document, including extensions merged at parse time.
    #[must_use]
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Prints the schema back as SDL.
    #[must_use]
    pub fn print(&self) -> String {
        self.document.to_string()
    }

    /// Looks up a named type.
    #[must_use]
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Looks up a named type, failing with [`Error::UnknownType`].
    pub fn expect_type(&self, name: &str) -> Result<&TypeDef> {
        self.type_def(name).ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
        })
    }

    /// All named types in declaration order, built-in scalars first.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Types of one kind, in declaration order.
    pub fn types_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = &TypeDef> {
        self.types.values().filter(move |t| t.kind == kind)
    }

    /// Custom directive definitions.
    pub fn directives(&self) -> impl Iterator<Item = &DirectiveDef> {
        self.directives.values()
    }

    /// Root type for an operation kind.
    #[must_use]
    pub fn root_type(&self, kind: OperationKind) -> Option<&TypeDef> {
        self.roots.get(&kind).and_then(|name| self.types.get(name))
    }

    /// Root type name for an operation kind.
    #[must_use]
    pub fn root_type_name(&self, kind: OperationKind) -> Option<&str> {
        self.roots.get(&kind).map(String::as_str)
    }

    /// Looks up a field of an object or interface type.
    pub fn field(&self, type_name: &str, field: &str) -> Result<&FieldDef> {
        self.expect_type(type_name)?
            .field(field)
            .ok_or_else(|| Error::UnknownField {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })
    }

    /// Concrete object types a value of `name` can have at runtime.
    #[must_use]
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        let Some(ty) = self.types.get(name) else {
            return Vec::new();
        };
        match ty.kind {
            TypeKind::Object => vec![ty.name.as_str()],
            TypeKind::Union => ty.members.iter().map(String::as_str).collect(),
            TypeKind::Interface => self
                .implementors
                .get(name)
                .into_iter()
                .flatten()
                .filter(|n| self.types.get(*n).is_some_and(|t| t.kind == TypeKind::Object))
                .map(String::as_str)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true when a value typed `concrete` satisfies a condition on
    /// `condition`: same type, member of the union, or implementor of the
    /// interface.
    #[must_use]
    pub fn satisfies(&self, concrete: &str, condition: &str) -> bool {
        if concrete == condition {
            return true;
        }
        let Some(ty) = self.types.get(concrete) else {
            return false;
        };
        if ty.implements(condition) {
            return true;
        }
        self.types.get(condition).is_some_and(|c| {
            c.kind == TypeKind::Union && c.members.iter().any(|m| m == concrete)
        })
    }

    /// Returns true when `name` is a scalar or enum.
    #[must_use]
    pub fn is_leaf(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(|t| t.kind.is_leaf())
    }
}

#[derive(Default)]
struct Builder {
    types: IndexMap<String, TypeDef>,
    directives: IndexMap<String, DirectiveDef>,
    roots: FxHashMap<OperationKind, String>,
}

impl Builder {
    fn add_type(&mut self, definition: &TypeDefinition<'static, String>) -> Result<()> {
        let def = convert_type(definition);
        match self.types.get(&def.name) {
            // Re-declaring a built-in scalar is tolerated.
            Some(existing) if existing.builtin && def.kind == TypeKind::Scalar => Ok(()),
            Some(_) => Err(Error::InvalidSchema {
                message: format!("type `{}` is defined more than once", def.name),
            }),
            None => {
                self.types.insert(def.name.clone(), def);
                Ok(())
            }
        }
    }

    fn add_directive(&mut self, directive: &ast::DirectiveDefinition<'static, String>) {
        self.directives.insert(
            directive.name.clone(),
            DirectiveDef {
                name: directive.name.clone(),
                description: directive.description.clone(),
                arguments: directive.arguments.iter().map(convert_input_value).collect(),
                locations: directive
                    .locations
                    .iter()
                    .map(|l| l.as_str().to_string())
                    .collect(),
            },
        );
    }

    fn extend_type(&mut self, extension: &TypeExtension<'static, String>) -> Result<()> {
        let (name, kind) = match extension {
            TypeExtension::Scalar(e) => (&e.name, TypeKind::Scalar),
            TypeExtension::Object(e) => (&e.name, TypeKind::Object),
            TypeExtension::Interface(e) => (&e.name, TypeKind::Interface),
            TypeExtension::Union(e) => (&e.name, TypeKind::Union),
            TypeExtension::Enum(e) => (&e.name, TypeKind::Enum),
            TypeExtension::InputObject(e) => (&e.name, TypeKind::InputObject),
        };
        let target = self
            .types
            .get_mut(name)
            .ok_or_else(|| Error::UnknownType { name: name.clone() })?;
        if target.kind != kind {
            return Err(Error::InvalidSchema {
                message: format!("extension of `{name}` does not match its kind"),
            });
        }

        match extension {
            TypeExtension::Scalar(e) => {
                target.directives.extend(e.directives.iter().map(convert_directive));
            }
            TypeExtension::Object(e) => {
                target.interfaces.extend(e.implements_interfaces.iter().cloned());
                target.directives.extend(e.directives.iter().map(convert_directive));
                for field in &e.fields {
                    target.fields.insert(field.name.clone(), convert_field(field));
                }
            }
            TypeExtension::Interface(e) => {
                target.directives.extend(e.directives.iter().map(convert_directive));
                for field in &e.fields {
                    target.fields.insert(field.name.clone(), convert_field(field));
                }
            }
            TypeExtension::Union(e) => {
                target.directives.extend(e.directives.iter().map(convert_directive));
                target.members.extend(e.types.iter().cloned());
            }
            TypeExtension::Enum(e) => {
                target.directives.extend(e.directives.iter().map(convert_directive));
                target.enum_values.extend(e.values.iter().map(convert_enum_value));
            }
            TypeExtension::InputObject(e) => {
                target.directives.extend(e.directives.iter().map(convert_directive));
                for field in &e.fields {
                    target
                        .input_fields
                        .insert(field.name.clone(), convert_input_value(field));
                }
            }
        }
        Ok(())
    }

    fn finish(mut self, document: SchemaDocument) -> Result<Schema> {
        for (kind, default) in [
            (OperationKind::Query, "Query"),
            (OperationKind::Mutation, "Mutation"),
            (OperationKind::Subscription, "Subscription"),
        ] {
            if !self.roots.contains_key(&kind) && self.types.contains_key(default) {
                self.roots.insert(kind, default.to_string());
            }
        }

        self.check_references()?;

        let mut implementors: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for ty in self.types.values() {
            for interface in &ty.interfaces {
                implementors
                    .entry(interface.clone())
                    .or_default()
                    .push(ty.name.clone());
            }
        }

        tracing::debug!(
            types = self.types.len(),
            directives = self.directives.len(),
            "indexed schema"
        );

        Ok(Schema {
            document,
            types: self.types,
            directives: self.directives,
            roots: self.roots,
            implementors,
        })
    }

    fn check_references(&self) -> Result<()> {
        let known = |name: &str| -> Result<()> {
            if self.types.contains_key(name) {
                Ok(())
            } else {
                Err(Error::UnknownType {
                    name: name.to_string(),
                })
            }
        };

        for root in self.roots.values() {
            known(root)?;
        }
        for ty in self.types.values() {
            for field in ty.fields.values() {
                known(&field.ty.name)?;
                for arg in &field.arguments {
                    known(&arg.ty.name)?;
                }
            }
            for field in ty.input_fields.values() {
                known(&field.ty.name)?;
            }
            for interface in &ty.interfaces {
                if self.types.get(interface).map(|t| t.kind) != Some(TypeKind::Interface) {
                    return Err(Error::InvalidSchema {
                        message: format!(
                            "`{}` implements `{interface}`, which is not an interface",
                            ty.name
                        ),
                    });
                }
            }
            for member in &ty.members {
                if self.types.get(member).map(|t| t.kind) != Some(TypeKind::Object) {
                    return Err(Error::InvalidSchema {
                        message: format!(
                            "union `{}` has member `{member}`, which is not an object type",
                            ty.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

fn convert_type(definition: &TypeDefinition<'static, String>) -> TypeDef {
    match definition {
        TypeDefinition::Scalar(s) => {
            let mut def = TypeDef::new(&s.name, TypeKind::Scalar);
            def.description.clone_from(&s.description);
            def.directives = s.directives.iter().map(convert_directive).collect();
            def
        }
        TypeDefinition::Object(o) => {
            let mut def = TypeDef::new(&o.name, TypeKind::Object);
            def.description.clone_from(&o.description);
            def.interfaces.clone_from(&o.implements_interfaces);
            def.directives = o.directives.iter().map(convert_directive).collect();
            def.fields = o
                .fields
                .iter()
                .map(|f| (f.name.clone(), convert_field(f)))
                .collect();
            def
        }
        TypeDefinition::Interface(i) => {
            let mut def = TypeDef::new(&i.name, TypeKind::Interface);
            def.description.clone_from(&i.description);
            def.directives = i.directives.iter().map(convert_directive).collect();
            def.fields = i
                .fields
                .iter()
                .map(|f| (f.name.clone(), convert_field(f)))
                .collect();
            def
        }
        TypeDefinition::Union(u) => {
            let mut def = TypeDef::new(&u.name, TypeKind::Union);
            def.description.clone_from(&u.description);
            def.directives = u.directives.iter().map(convert_directive).collect();
            def.members.clone_from(&u.types);
            def
        }
        TypeDefinition::Enum(e) => {
            let mut def = TypeDef::new(&e.name, TypeKind::Enum);
            def.description.clone_from(&e.description);
            def.directives = e.directives.iter().map(convert_directive).collect();
            def.enum_values = e.values.iter().map(convert_enum_value).collect();
            def
        }
        TypeDefinition::InputObject(i) => {
            let mut def = TypeDef::new(&i.name, TypeKind::InputObject);
            def.description.clone_from(&i.description);
            def.directives = i.directives.iter().map(convert_directive).collect();
            def.input_fields = i
                .fields
                .iter()
                .map(|f| (f.name.clone(), convert_input_value(f)))
                .collect();
            def
        }
    }
}

fn convert_field(field: &ast::Field<'static, String>) -> FieldDef {
    let directives: Vec<DirectiveUse> = field.directives.iter().map(convert_directive).collect();
    FieldDef {
        name: field.name.clone(),
        description: field.description.clone(),
        ty: TypeRef::from_ast(&field.field_type),
        arguments: field.arguments.iter().map(convert_input_value).collect(),
        deprecation: deprecation(&directives),
        directives,
    }
}

fn convert_input_value(value: &ast::InputValue<'static, String>) -> InputValueDef {
    InputValueDef {
        name: value.name.clone(),
        description: value.description.clone(),
        ty: TypeRef::from_ast(&value.value_type),
        default_value: value.default_value.as_ref().map(print_value),
        directives: value.directives.iter().map(convert_directive).collect(),
    }
}

fn convert_enum_value(value: &ast::EnumValue<'static, String>) -> EnumValueDef {
    let directives: Vec<DirectiveUse> = value.directives.iter().map(convert_directive).collect();
    EnumValueDef {
        name: value.name.clone(),
        description: value.description.clone(),
        deprecation: deprecation(&directives),
    }
}

fn convert_directive(directive: &ast::Directive<'static, String>) -> DirectiveUse {
    DirectiveUse {
        name: directive.name.clone(),
        arguments: directive
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), print_value(value)))
            .collect(),
    }
}

fn deprecation(directives: &[DirectiveUse]) -> Option<Deprecation> {
    directives
        .iter()
        .find(|d| d.name == "deprecated")
        .map(|d| Deprecation {
            reason: d.argument("reason").map(unquote),
        })
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .replace("\\\"", "\"")
}

/// Prints a GraphQL value in SDL syntax.
#[must_use]
pub fn print_value<'a, T: graphql_parser::query::Text<'a>>(
    value: &graphql_parser::query::Value<'a, T>,
) -> String {
    use graphql_parser::query::Value;

    match value {
        Value::Variable(name) => format!("${}", name.as_ref()),
        Value::Int(number) => number
            .as_i64()
            .map_or_else(|| "0".to_string(), |n| n.to_string()),
        Value::Float(float) => float.to_string(),
        Value::String(string) => format!("{string:?}"),
        Value::Boolean(boolean) => boolean.to_string(),
        Value::Null => "null".to_string(),
        Value::Enum(name) => name.as_ref().to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{}: {}", name.as_ref(), print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}
