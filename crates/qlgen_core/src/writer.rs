//! Indentation-aware text output used by the target-language visitors.

/// Writer options.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Number of spaces for indentation.
    pub indent_size: usize,
    /// Use tabs instead of spaces.
    pub use_tabs: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            use_tabs: false,
        }
    }
}

/// Line-oriented code writer.
#[derive(Debug, Clone, Default)]
pub struct CodeWriter {
    options: WriterOptions,
    output: String,
    indent: usize,
}

impl CodeWriter {
    /// Creates a writer with two-space indentation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with the given options.
    #[must_use]
    pub fn with_options(options: WriterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Writes one indented line. Empty input produces an empty line.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            self.push_indent();
            self.output.push_str(text);
        }
        self.output.push('\n');
        self
    }

    /// Writes an empty line.
    pub fn blank(&mut self) -> &mut Self {
        self.output.push('\n');
        self
    }

    /// Writes every line of `text`, indented at the current level.
    pub fn lines(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            self.line(line);
        }
        self
    }

    /// Writes `open`, runs `body` one level deeper, then writes `close`.
    pub fn block(&mut self, open: &str, close: &str, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(open);
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.line(close)
    }

    /// Increases indentation.
    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    /// Decreases indentation.
    pub fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// Returns the text written so far without the trailing newline.
    #[must_use]
    pub fn finish(self) -> String {
        let mut output = self.output;
        while output.ends_with('\n') {
            output.pop();
        }
        output
    }

    fn push_indent(&mut self) {
        if self.options.use_tabs {
            for _ in 0..self.indent {
                self.output.push('\t');
            }
        } else {
            let spaces = self.indent * self.options.indent_size;
            self.output.extend(std::iter::repeat(' ').take(spaces));
        }
    }
}

/// Renders a doc comment in the `/** ... */` style shared by TypeScript,
/// Flow, Java and Kotlin.
#[must_use]
pub fn block_comment(description: &str) -> String {
    let lines: Vec<&str> = description.trim().lines().map(str::trim_end).collect();
    match lines.as_slice() {
        [] => String::new(),
        [single] => format!("/** {single} */"),
        many => {
            let mut out = String::from("/**\n");
            for line in many {
                if line.is_empty() {
                    out.push_str(" *\n");
                } else {
                    out.push_str(" * ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push_str(" */");
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indentation() {
        let mut w = CodeWriter::new();
        w.block("export type User = {", "};", |w| {
            w.line("id: string;");
        });
        assert_eq!(w.finish(), "export type User = {\n  id: string;\n};");
    }

    #[test]
    fn test_tabs() {
        let mut w = CodeWriter::with_options(WriterOptions {
            indent_size: 4,
            use_tabs: true,
        });
        w.block("class A {", "}", |w| {
            w.line("int x;").blank();
        });
        assert_eq!(w.finish(), "class A {\n\tint x;\n\n}");
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(block_comment("A user"), "/** A user */");
        assert_eq!(block_comment("One\n\nTwo"), "/**\n * One\n *\n * Two\n */");
        assert_eq!(block_comment("  "), "");
    }
}
