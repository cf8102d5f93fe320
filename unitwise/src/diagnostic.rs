use codespan_reporting::diagnostic::LabelStyle;
use thiserror::Error;

use crate::{
    dimension::Dimension, number::NumberError, operator::Signature, span::Span,
    unit::UnitError,
};

pub type CodespanDiagnostic = codespan_reporting::diagnostic::Diagnostic<usize>;

/// Convert into a diagnostic that `codespan-reporting` can render against the
/// source file with the given id.
pub trait ErrorDiagnostic {
    fn diagnostic(&self, file_id: usize) -> CodespanDiagnostic;
}

/// Everything that can go wrong while evaluating a single node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Dimension mismatch: {expected} is not compatible with {actual}")]
    DimensionMismatch {
        expected: Dimension,
        actual: Dimension,
    },

    #[error("Division by zero")]
    DivideByZero,

    #[error("{0}")]
    UnitError(#[from] UnitError),

    #[error("Unknown variable '{name}'")]
    UnknownVariable {
        name: String,
        suggestion: Option<String>,
    },

    #[error("No operator '{symbol}' for {signature}")]
    UnknownOperator { symbol: String, signature: Signature },

    #[error("Unknown unit '{name}'")]
    UnknownUnit {
        name: String,
        suggestion: Option<String>,
    },

    #[error("{0}")]
    InvalidNumber(#[from] NumberError),

    #[error("Cannot redefine the constant '{0}'")]
    ReadOnlyVariable(String),
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            ErrorKind::DivideByZero => "DIVIDE_BY_ZERO",
            ErrorKind::UnitError(_) => "UNIT_ERROR",
            ErrorKind::UnknownVariable { .. } => "UNKNOWN_VARIABLE",
            ErrorKind::UnknownOperator { .. } => "UNKNOWN_OPERATOR",
            ErrorKind::UnknownUnit { .. } => "UNKNOWN_UNIT",
            ErrorKind::InvalidNumber(_) => "INVALID_NUMBER",
            ErrorKind::ReadOnlyVariable(_) => "READ_ONLY_VARIABLE",
        }
    }

    fn suggestion(&self) -> Option<&str> {
        match self {
            ErrorKind::UnknownVariable { suggestion, .. }
            | ErrorKind::UnknownUnit { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

/// An error recorded against the span of the node that caused it, and
/// optionally a second node involved (the other operand of a mismatch).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub primary: Span,
    pub secondary: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, primary: Span) -> Self {
        Self {
            kind,
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Span) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl ErrorDiagnostic for Diagnostic {
    fn diagnostic(&self, file_id: usize) -> CodespanDiagnostic {
        let (primary_message, secondary_message) = match &self.kind {
            ErrorKind::DimensionMismatch { expected, actual } => {
                (format!("{expected}"), format!("{actual}"))
            }
            ErrorKind::DivideByZero => ("divisor is zero".to_owned(), String::new()),
            kind => (kind.to_string(), String::new()),
        };

        let mut labels = vec![self
            .primary
            .diagnostic_label(LabelStyle::Primary, file_id)
            .with_message(primary_message)];
        if let Some(secondary) = self.secondary {
            labels.push(
                secondary
                    .diagnostic_label(LabelStyle::Secondary, file_id)
                    .with_message(secondary_message),
            );
        }

        let notes = self
            .kind
            .suggestion()
            .map(|suggestion| vec![format!("Did you mean '{suggestion}'?")])
            .unwrap_or_default();

        CodespanDiagnostic::error()
            .with_code(self.code())
            .with_message(self.kind.to_string())
            .with_labels(labels)
            .with_notes(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(ErrorKind::DivideByZero.code(), "DIVIDE_BY_ZERO");
        assert_eq!(
            ErrorKind::DimensionMismatch {
                expected: Dimension::base("Length"),
                actual: Dimension::base("Time"),
            }
            .code(),
            "DIMENSION_MISMATCH"
        );
        assert_eq!(
            ErrorKind::UnitError(UnitError::UnsupportedExponent(0.3)).code(),
            "UNIT_ERROR"
        );
    }

    #[test]
    fn codespan_labels() {
        let diagnostic = Diagnostic::new(
            ErrorKind::DimensionMismatch {
                expected: Dimension::base("Length"),
                actual: Dimension::base("Time"),
            },
            Span::new(0, 3),
        )
        .with_secondary(Span::new(6, 9));

        let rendered = diagnostic.diagnostic(7);
        assert_eq!(rendered.code.as_deref(), Some("DIMENSION_MISMATCH"));
        assert_eq!(rendered.labels.len(), 2);
        assert_eq!(rendered.labels[0].style, LabelStyle::Primary);
        assert_eq!(rendered.labels[0].file_id, 7);
        assert_eq!(rendered.labels[0].range, 0..3);
        assert_eq!(rendered.labels[1].range, 6..9);
        assert_eq!(rendered.labels[1].message, "Time");
    }

    #[test]
    fn suggestions_become_notes() {
        let diagnostic = Diagnostic::new(
            ErrorKind::UnknownVariable {
                name: "lenght".into(),
                suggestion: Some("length".into()),
            },
            Span::new(0, 6),
        );
        let rendered = diagnostic.diagnostic(0);
        assert_eq!(rendered.message, "Unknown variable 'lenght'");
        assert_eq!(rendered.notes, vec!["Did you mean 'length'?".to_owned()]);
    }
}
