use codespan_reporting::diagnostic::{Label, LabelStyle};

/// A byte range `start..end` in the source text of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// The span covered by `literal` when it starts at byte `offset`.
    pub fn for_literal(offset: usize, literal: &str) -> Self {
        Self::new(offset, offset + literal.len())
    }

    pub fn offset_first(&self) -> usize {
        self.start
    }

    /// Byte offset of the last character, or `start` for an empty span.
    pub fn offset_last(&self) -> usize {
        self.end.saturating_sub(1).max(self.start)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn extend(&self, other: &Span) -> Span {
        Span {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }

    pub fn diagnostic_label(&self, style: LabelStyle, file_id: usize) -> Label<usize> {
        Label::new(style, file_id, self.start..self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        let span = Span::for_literal(4, "km");
        assert_eq!(span, Span::new(4, 6));
        assert_eq!(span.offset_first(), 4);
        assert_eq!(span.offset_last(), 5);
        assert_eq!(Span::new(3, 3).offset_last(), 3);
    }

    #[test]
    fn extend() {
        let lhs = Span::new(0, 4);
        let rhs = Span::new(7, 10);
        assert_eq!(lhs.extend(&rhs), Span::new(0, 10));
        assert_eq!(rhs.extend(&lhs), Span::new(0, 10));
    }
}
