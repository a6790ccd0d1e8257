//! Import accumulation.

use indexmap::IndexSet;

/// Ordered, de-duplicated set of import or header lines.
///
/// A visitor owns one of these for the duration of a single plugin run and
/// hands it back through [`ImportSet::drain`] when it builds its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    lines: IndexSet<String>,
}

impl ImportSet {
    /// Creates an empty import set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line. Returns false when it was already present.
    pub fn insert(&mut self, line: impl Into<String>) -> bool {
        self.lines.insert(line.into())
    }

    /// Returns true if `line` has been recorded.
    #[must_use]
    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains(line)
    }

    /// Merges another set into this one, keeping first-seen order.
    pub fn extend(&mut self, other: ImportSet) {
        self.lines.extend(other.lines);
    }

    /// Consumes the set and returns its lines in insertion order.
    #[must_use]
    pub fn drain(self) -> Vec<String> {
        self.lines.into_iter().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

impl<S: Into<String>> FromIterator<S> for ImportSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_order() {
        let mut imports = ImportSet::new();
        assert!(imports.insert("using System;"));
        assert!(imports.insert("using Newtonsoft.Json;"));
        assert!(!imports.insert("using System;"));

        assert_eq!(
            imports.drain(),
            vec!["using System;".to_string(), "using Newtonsoft.Json;".to_string()]
        );
    }

    #[test]
    fn test_extend() {
        let mut a: ImportSet = ["import a;", "import b;"].into_iter().collect();
        let b: ImportSet = ["import b;", "import c;"].into_iter().collect();
        a.extend(b);
        assert_eq!(a.len(), 3);
        assert!(a.contains("import c;"));
    }
}
