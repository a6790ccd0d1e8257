//! Type name conversion.

/// Turns a schema type name into the name emitted for it.
pub trait NameConverter: Send + Sync {
    fn convert(&self, name: &str) -> String;
}

/// Adds a fixed prefix and suffix to every name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeNames {
    prefix: String,
    suffix: String,
}

impl TypeNames {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl NameConverter for TypeNames {
    fn convert(&self, name: &str) -> String {
        format!("{}{name}{}", self.prefix, self.suffix)
    }
}
