//! Scalar name resolution.

use rustc_hash::FxHashMap;

/// Maps GraphQL scalar names to target-language type names.
pub trait ScalarResolver: Send + Sync {
    /// Returns the target type for `scalar`, or `None` when it is not mapped.
    fn resolve(&self, scalar: &str) -> Option<&str>;

    /// The type used for scalars with no mapping.
    fn fallback(&self) -> &str;

    /// Resolves `scalar`, falling back when it is not mapped.
    fn resolve_or_fallback(&self, scalar: &str) -> &str {
        self.resolve(scalar).unwrap_or_else(|| self.fallback())
    }
}

/// A table-backed [`ScalarResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarMap {
    map: FxHashMap<String, String>,
    fallback: String,
}

impl ScalarMap {
    /// Creates a map from `(scalar, target)` pairs.
    pub fn new<'s>(
        entries: impl IntoIterator<Item = (&'s str, &'s str)>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback: fallback.into(),
        }
    }

    /// Built-in scalars for TypeScript.
    #[must_use]
    pub fn typescript() -> Self {
        Self::new(
            [
                ("ID", "string"),
                ("String", "string"),
                ("Boolean", "boolean"),
                ("Int", "number"),
                ("Float", "number"),
            ],
            "any",
        )
    }

    /// Built-in scalars for Flow.
    #[must_use]
    pub fn flow() -> Self {
        Self::typescript()
    }

    /// Built-in scalars for Java.
    #[must_use]
    pub fn java() -> Self {
        Self::new(
            [
                ("ID", "Object"),
                ("String", "String"),
                ("Boolean", "Boolean"),
                ("Int", "Integer"),
                ("Float", "Double"),
            ],
            "Object",
        )
    }

    /// Built-in scalars for C#.
    #[must_use]
    pub fn csharp() -> Self {
        Self::new(
            [
                ("ID", "string"),
                ("String", "string"),
                ("Boolean", "bool"),
                ("Int", "int"),
                ("Float", "double"),
                ("Date", "DateTime"),
            ],
            "object",
        )
    }

    /// Built-in scalars for Kotlin.
    #[must_use]
    pub fn kotlin() -> Self {
        Self::new(
            [
                ("ID", "Any"),
                ("String", "String"),
                ("Boolean", "Boolean"),
                ("Int", "Int"),
                ("Float", "Float"),
            ],
            "Any",
        )
    }

    /// Adds or replaces one mapping.
    pub fn insert(&mut self, scalar: impl Into<String>, target: impl Into<String>) {
        self.map.insert(scalar.into(), target.into());
    }

    /// Applies user-configured overrides on top of the defaults.
    #[must_use]
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (scalar, target) in overrides {
            self.insert(scalar, target);
        }
        self
    }

    /// Replaces the fallback type.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Returns true when `scalar` has an explicit mapping.
    #[must_use]
    pub fn contains(&self, scalar: &str) -> bool {
        self.map.contains_key(scalar)
    }
}

impl ScalarResolver for ScalarMap {
    fn resolve(&self, scalar: &str) -> Option<&str> {
        self.map.get(scalar).map(String::as_str)
    }

    fn fallback(&self) -> &str {
        &self.fallback
    }
}
