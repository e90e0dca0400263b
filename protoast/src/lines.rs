use protoast_parse::ast::Span;

use crate::ast::Position;

/// Maps byte offsets in a source file to line and column numbers.
#[derive(Debug, Clone)]
pub(crate) struct LineResolver {
    file: String,
    lines: Vec<usize>,
}

impl LineResolver {
    pub fn new(file: impl Into<String>, source_code: &str) -> Self {
        let lines = source_code
            .match_indices('\n')
            .map(|(index, _)| index + 1)
            .collect();
        LineResolver {
            file: file.into(),
            lines,
        }
    }

    /// Returns the zero-based line and column of `offset`.
    pub fn resolve(&self, offset: usize) -> (usize, usize) {
        match self.lines.binary_search(&offset) {
            Ok(index) => (index + 1, 0),
            Err(0) => (0, offset),
            Err(index) => (index, offset - self.lines[index - 1]),
        }
    }

    pub fn position(&self, span: &Span) -> Position {
        let (line, column) = self.resolve(span.start);
        Position {
            file: self.file.clone(),
            offset: span.start,
            line: line + 1,
            column: column + 1,
        }
    }
}

#[test]
fn resolve_line_number() {
    let resolver = LineResolver::new("test.proto", "hello\nworld\nfoo");

    assert_eq!(resolver.resolve(0), (0, 0));
    assert_eq!(resolver.resolve(4), (0, 4));
    assert_eq!(resolver.resolve(5), (0, 5));
    assert_eq!(resolver.resolve(6), (1, 0));
    assert_eq!(resolver.resolve(7), (1, 1));
    assert_eq!(resolver.resolve(11), (1, 5));
    assert_eq!(resolver.resolve(12), (2, 0));
    assert_eq!(resolver.resolve(14), (2, 2));
}

#[test]
fn position_is_one_based() {
    let resolver = LineResolver::new("test.proto", "hello\nworld\nfoo");

    let position = resolver.position(&(7..9));
    assert_eq!(position.line, 2);
    assert_eq!(position.column, 2);
    assert_eq!(position.offset, 7);
    assert_eq!(position.to_string(), "test.proto:2:2");
}
