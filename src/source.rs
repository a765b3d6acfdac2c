//! Source text abstraction
//!
//! A `SourceCode` owns the text of one compilation unit. Every token, AST
//! node and error carries a `SourceLocation` that points back into it, so
//! diagnostics can show the offending line long after lexing is done.

use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where a piece of source text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Read from a file on disk
    File(PathBuf),
    /// Typed at the REPL or passed in as a string
    Inline,
}

/// The text of a single compilation unit
pub struct SourceCode {
    origin: Origin,
    text: String,
    chars: Vec<char>,
    lines: OnceCell<Vec<String>>,
}

impl SourceCode {
    /// Wrap text that has no backing file
    pub fn inline(text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(Origin::Inline, text.into()))
    }

    /// Wrap text that was read from `path`
    pub fn with_path(path: impl Into<PathBuf>, text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(Origin::File(path.into()), text.into()))
    }

    /// Read a `.zen` file from disk
    pub fn load(path: impl AsRef<Path>) -> io::Result<Rc<Self>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Self::with_path(path, text))
    }

    fn build(origin: Origin, text: String) -> Self {
        Self {
            origin,
            chars: text.chars().collect(),
            text,
            lines: OnceCell::new(),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Inline => None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Character at `index`, or `'\0'` past the end
    pub fn char_at(&self, index: usize) -> char {
        self.chars.get(index).copied().unwrap_or('\0')
    }

    /// Text of the 1-based line `number`, or `""` when out of range
    pub fn line(&self, number: usize) -> &str {
        let lines = self.lines.get_or_init(|| {
            self.text
                .split('\n')
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect()
        });

        number
            .checked_sub(1)
            .and_then(|index| lines.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Build a location inside this source
    pub fn location(self: &Rc<Self>, line: usize, column: usize) -> SourceLocation {
        SourceLocation {
            source: Rc::clone(self),
            line,
            column,
        }
    }
}

impl fmt::Debug for SourceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCode")
            .field("origin", &self.origin)
            .field("len", &self.len())
            .finish()
    }
}

/// A position inside a `SourceCode`
#[derive(Clone)]
pub struct SourceLocation {
    source: Rc<SourceCode>,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (0-based)
    pub column: usize,
}

impl SourceLocation {
    pub fn source(&self) -> &SourceCode {
        &self.source
    }

    /// The full text of the line this location points at
    pub fn source_line(&self) -> &str {
        self.source.line(self.line)
    }

    /// The source line followed by a caret under the column
    pub fn line_with_marker(&self) -> String {
        format!("{}\n{}^", self.source_line(), " ".repeat(self.column))
    }
}

impl PartialEq for SourceLocation {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line
            && self.column == other.column
            && self.source.origin == other.source.origin
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SourceLocation");
        if let Some(path) = self.source.path() {
            s.field("path", &path);
        }
        s.field("line", &self.line).field("column", &self.column).finish()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, Column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_lookup() {
        let source = SourceCode::inline("var x = 1\r\nvar y = 2\n");
        assert_eq!(source.line(1), "var x = 1");
        assert_eq!(source.line(2), "var y = 2");
        assert_eq!(source.line(0), "");
        assert_eq!(source.line(42), "");
    }

    #[test]
    fn test_char_at() {
        let source = SourceCode::inline("ab");
        assert_eq!(source.len(), 2);
        assert_eq!(source.char_at(1), 'b');
        assert_eq!(source.char_at(2), '\0');
    }

    #[test]
    fn test_location_display() {
        let source = SourceCode::inline("print(x)");
        let loc = source.location(1, 6);
        assert_eq!(loc.to_string(), "Line 1, Column 6");
        assert_eq!(loc.line_with_marker(), "print(x)\n      ^");
    }

    #[test]
    fn test_file_origin() {
        let source = SourceCode::with_path("main.zen", "");
        assert_eq!(source.path(), Some(Path::new("main.zen")));
        assert!(source.is_empty());
        assert!(SourceCode::inline("").path().is_none());
    }
}
