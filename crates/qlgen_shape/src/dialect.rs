//! Type-level syntax of the TypeScript and Flow targets.

use qlgen_schema::WrappingEncoder;

/// One property of an object type literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectField {
    pub key: String,
    pub ty: String,
    pub optional: bool,
}

impl ObjectField {
    pub fn new(key: impl Into<String>, ty: impl Into<String>, optional: bool) -> Self {
        Self {
            key: key.into(),
            ty: ty.into(),
            optional,
        }
    }
}

/// Structural type syntax for a target language.
pub trait Dialect: WrappingEncoder + Send + Sync {
    /// A string literal type.
    fn string_literal(&self, value: &str) -> String;

    /// Restricts `type_name` to `fields`.
    fn pick(&self, type_name: &str, fields: &[&str]) -> String;

    /// The type of one property of `type_name`.
    fn property_type(&self, type_name: &str, field: &str) -> String;

    /// An object type literal.
    fn object(&self, fields: &[ObjectField]) -> String;

    /// When true an optional key already admits `null`, so values under an
    /// optional key drop their outer nullability.
    fn optional_key_admits_null(&self) -> bool {
        false
    }

    /// Joins parts with `&`. No parts yields an empty object.
    fn intersection(&self, mut parts: Vec<String>) -> String {
        match parts.len() {
            0 => self.object(&[]),
            1 => parts.remove(0),
            _ => parts.join(" & "),
        }
    }

    /// Joins alternatives with `|`, parenthesised when there is more than one.
    fn union(&self, mut members: Vec<String>) -> String {
        match members.len() {
            0 => self.object(&[]),
            1 => members.remove(0),
            _ => format!("({})", members.join(" | ")),
        }
    }
}

/// How TypeScript marks a nullable type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NullableStyle {
    /// `Maybe<T>`, relying on the `Maybe` alias of the schema types.
    #[default]
    Maybe,
    /// `T | null`.
    NullUnion,
    /// A user template where `T` stands for the wrapped type.
    Template(String),
}

/// TypeScript syntax.
#[derive(Debug, Clone, Default)]
pub struct TypeScript {
    pub nullable: NullableStyle,
    /// Emit `readonly` properties and `ReadonlyArray`.
    pub immutable: bool,
}

impl TypeScript {
    #[must_use]
    pub fn new(nullable: NullableStyle) -> Self {
        Self {
            nullable,
            immutable: false,
        }
    }

    #[must_use]
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }
}

impl WrappingEncoder for TypeScript {
    fn list(&self, item: String) -> String {
        if self.immutable {
            format!("ReadonlyArray<{item}>")
        } else {
            format!("Array<{item}>")
        }
    }

    fn nullable(&self, ty: String) -> String {
        match &self.nullable {
            NullableStyle::Maybe => format!("Maybe<{ty}>"),
            NullableStyle::NullUnion => format!("{ty} | null"),
            NullableStyle::Template(template) => template.replacen('T', &ty, 1),
        }
    }
}

impl Dialect for TypeScript {
    fn string_literal(&self, value: &str) -> String {
        format!("'{value}'")
    }

    fn pick(&self, type_name: &str, fields: &[&str]) -> String {
        let keys: Vec<String> = fields.iter().map(|f| self.string_literal(f)).collect();
        format!("Pick<{type_name}, {}>", keys.join(" | "))
    }

    fn property_type(&self, type_name: &str, field: &str) -> String {
        format!("{type_name}['{field}']")
    }

    fn object(&self, fields: &[ObjectField]) -> String {
        if fields.is_empty() {
            return "{}".to_string();
        }
        let readonly = if self.immutable { "readonly " } else { "" };
        let props: Vec<String> = fields
            .iter()
            .map(|f| {
                let marker = if f.optional { "?" } else { "" };
                format!("{readonly}{}{marker}: {}", f.key, f.ty)
            })
            .collect();
        format!("{{ {} }}", props.join("; "))
    }

    fn optional_key_admits_null(&self) -> bool {
        true
    }
}

/// Flow syntax.
#[derive(Debug, Clone)]
pub struct Flow {
    /// Emit exact object types `{| |}`.
    pub exact: bool,
    /// Emit covariant `+key` properties.
    pub read_only: bool,
}

impl Default for Flow {
    fn default() -> Self {
        Self {
            exact: true,
            read_only: false,
        }
    }
}

impl WrappingEncoder for Flow {
    fn list(&self, item: String) -> String {
        if self.read_only {
            format!("$ReadOnlyArray<{item}>")
        } else {
            format!("Array<{item}>")
        }
    }

    fn nullable(&self, ty: String) -> String {
        if has_top_level_operator(&ty) {
            format!("?({ty})")
        } else {
            format!("?{ty}")
        }
    }
}

impl Dialect for Flow {
    fn string_literal(&self, value: &str) -> String {
        format!("'{value}'")
    }

    fn pick(&self, type_name: &str, fields: &[&str]) -> String {
        let keys: Vec<String> = fields.iter().map(|f| format!("{f}: *")).collect();
        let (open, close) = if self.exact { ("{|", "|}") } else { ("{", "}") };
        format!("$Pick<{type_name}, {open} {} {close}>", keys.join(", "))
    }

    fn property_type(&self, type_name: &str, field: &str) -> String {
        format!("$ElementType<{type_name}, '{field}'>")
    }

    fn object(&self, fields: &[ObjectField]) -> String {
        let (open, close) = if self.exact { ("{|", "|}") } else { ("{", "}") };
        if fields.is_empty() {
            return format!("{open}{close}");
        }
        let variance = if self.read_only { "+" } else { "" };
        let props: Vec<String> = fields
            .iter()
            .map(|f| {
                let marker = if f.optional { "?" } else { "" };
                format!("{variance}{}{marker}: {}", f.key, f.ty)
            })
            .collect();
        format!("{open} {} {close}", props.join(", "))
    }

    /// Spreads the parts into one object. An `&` of exact objects has no
    /// values, so parts are never intersected.
    fn intersection(&self, mut parts: Vec<String>) -> String {
        match parts.len() {
            0 => self.object(&[]),
            1 => parts.remove(0),
            _ => {
                let (open, close) = if self.exact { ("{|", "|}") } else { ("{", "}") };
                let spreads: Vec<String> = parts.iter().map(|part| format!("...{part}")).collect();
                format!("{open} {} {close}", spreads.join(", "))
            }
        }
    }
}

/// True when `ty` is a bare union or intersection, i.e. ` | ` or ` & `
/// appears outside any brackets.
fn has_top_level_operator(ty: &str) -> bool {
    let mut depth = 0usize;
    let bytes = ty.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        match byte {
            b'(' | b'{' | b'[' | b'<' => depth += 1,
            b')' | b'}' | b']' | b'>' => depth = depth.saturating_sub(1),
            b'|' | b'&' if depth == 0 && i > 0 && bytes[i - 1] == b' ' => return true,
            _ => {}
        }
    }
    false
}
