use std::fmt::{Display, Formatter};

use crate::token::TokenKind;
use crate::util::Code;

/// The kind of failure a compile or evaluation step can report. Carrying a
/// closed set of kinds (rather than one exception class per kind, as the
/// reference implementation does) keeps callers able to match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    EmptyExpression,
    LexerError { message: String },
    ParseError { token_kind: TokenKind, token_value: String },
    IncompleteExpression,
    UnknownFunction { function_name: String },
    InvalidArity {
        function_name: String,
        expected_arity: usize,
        actual_arity: usize,
    },
    VariadicArity {
        function_name: String,
        expected_arity: usize,
        actual_arity: usize,
    },
    InvalidType {
        function_name: String,
        expected_types: String,
        actual_type: String,
    },
    InvalidValue { message: String },
}

/// A compile- or run-time error produced by the engine. Every failure mode
/// propagates through this single type; the core never swallows an error.
#[derive(Debug, Clone)]
pub struct JmespathError {
    pub kind: ErrorKind,
    pub position: Option<usize>,
    pub expression: Option<String>,
}

impl JmespathError {
    pub fn new(kind: ErrorKind, position: Option<usize>) -> Self {
        Self {
            kind,
            position,
            expression: None,
        }
    }

    pub fn empty_expression() -> Self {
        Self::new(ErrorKind::EmptyExpression, None)
    }

    pub fn lexer(position: usize, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::LexerError {
                message: message.into(),
            },
            Some(position),
        )
    }

    /// Attach the original source expression so the error's `Display`
    /// output can render a caret-underlined diagnostic, mirroring
    /// `ParseError.expression` in the reference implementation.
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

impl Display for JmespathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind.message())?;
        if let (Some(expr), Some(pos)) = (&self.expression, self.position) {
            let code = Code::new(expr);
            write!(
                f,
                "\n{}\n(at {})",
                code.underline_at(pos),
                code.obtain_position(pos)
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for JmespathError {}

impl ErrorKind {
    fn message(&self) -> String {
        match self {
            ErrorKind::EmptyExpression => {
                "Invalid jmespath expression: expression is empty".into()
            }
            ErrorKind::LexerError { message } => format!("Bad jmespath expression: {}", message),
            ErrorKind::ParseError {
                token_kind,
                token_value,
            } => format!(
                "Invalid jmespath expression: parse error near token \"{}\" ({:?})",
                token_value, token_kind
            ),
            ErrorKind::IncompleteExpression => {
                "Invalid jmespath expression: incomplete expression".into()
            }
            ErrorKind::UnknownFunction { function_name } => {
                format!("Unknown function: {}()", function_name)
            }
            ErrorKind::InvalidArity {
                function_name,
                expected_arity,
                actual_arity,
            } => format!(
                "Expected {} argument(s) for function {}(), received {}",
                expected_arity, function_name, actual_arity
            ),
            ErrorKind::VariadicArity {
                function_name,
                expected_arity,
                actual_arity,
            } => format!(
                "Expected at least {} argument(s) for function {}(), received {}",
                expected_arity, function_name, actual_arity
            ),
            ErrorKind::InvalidType {
                function_name,
                expected_types,
                actual_type,
            } => format!(
                "In function {}(), invalid type for argument: expected one of: {}, received: \"{}\"",
                function_name, expected_types, actual_type
            ),
            ErrorKind::InvalidValue { message } => message.clone(),
        }
    }
}
