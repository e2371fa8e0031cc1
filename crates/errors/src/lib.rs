use std::fmt;

use ariadne::{Config, Label, Report, ReportKind, Source};
use smol_str::SmolStr;
use thiserror::Error;

/// A location in a named source, both coordinates 1-based.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    pub source: SmolStr,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new<S: Into<SmolStr>>(source: S, line: usize, column: usize) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    /// Character offset of this position inside `text`, clamped to its length.
    pub fn offset_in(&self, text: &str) -> usize {
        let before: usize = text
            .split_inclusive('\n')
            .take(self.line.saturating_sub(1))
            .map(|line| line.chars().count())
            .sum();

        (before + self.column.saturating_sub(1)).min(text.chars().count())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ScmError {
    #[error(transparent)]
    ParsingError(#[from] ParsingError),

    #[error(transparent)]
    InterpretingError(#[from] InterpretingError),
}

impl ScmError {
    pub fn position(&self) -> &Position {
        match self {
            Self::ParsingError(e) => e.position(),
            Self::InterpretingError(e) => e.position(),
        }
    }

    /// Renders the error against the text it was raised for.
    pub fn to_report(&self, source: &str) -> String {
        let message = self.to_string();
        let position = self.position();

        let len = source.chars().count();
        if len == 0 {
            return self.to_string();
        }

        let start = position.offset_in(source).min(len.saturating_sub(1));
        let end = (start + 1).min(len);

        let report: Report = Report::build(ReportKind::Error, (), start)
            .with_message(message)
            .with_label(Label::new(start..end).with_message("「here」"))
            .with_config(Config::default().with_color(false))
            .finish();

        let mut buf = Vec::new();
        match report.write(Source::from(source), &mut buf) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParsingError {
    #[error("{position} Illegal escape sequence: '{found}'")]
    IllegalEscapeSequence { position: Position, found: char },

    #[error("{position} String literal must be a single line")]
    StringLiteralMustBeASingleLine { position: Position },

    #[error("{position} Unexpected input char: '{found}'")]
    UnexpectedInputChar { position: Position, found: char },

    #[error("{position} Top-level element must be a list")]
    TopLevelElementMustBeAList { position: Position },

    #[error("{position} Missing closing parenthesis")]
    MissingClosingParenthesis { position: Position },
}

impl ParsingError {
    pub fn position(&self) -> &Position {
        match self {
            Self::IllegalEscapeSequence { position, .. }
            | Self::StringLiteralMustBeASingleLine { position }
            | Self::UnexpectedInputChar { position, .. }
            | Self::TopLevelElementMustBeAList { position }
            | Self::MissingClosingParenthesis { position } => position,
        }
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InterpretingError {
    #[error("{position} Undefined symbol: {name}")]
    UndefinedSymbol { position: Position, name: SmolStr },

    #[error("{position} An empty list is not allowed")]
    EmptyListNotAllowed { position: Position },

    #[error(
        "{position} The first element of the list to be evaluated must be a callable object, but this is type {found}"
    )]
    FirstElementMustBeCallable { position: Position, found: SmolStr },

    #[error("{position} The number of arguments does not match (expected {expected}, got {actual})")]
    ArgumentCountMismatch {
        position: Position,
        expected: usize,
        actual: usize,
    },

    #[error("{position} Insufficient number of arguments (expected at least {minimum}, got {actual})")]
    InsufficientArguments {
        position: Position,
        minimum: usize,
        actual: usize,
    },

    #[error("{position} You cannot bind a value to anything other than a symbol")]
    CannotBindToNonSymbol { position: Position },

    #[error("{position} The argument list must consist of symbols only")]
    ArgumentListMustBeSymbolsOnly { position: Position },

    #[error("{position} Non-arithmetic data type: {found}")]
    NonArithmeticDataType { position: Position, found: SmolStr },

    #[error("{position} Type mismatch (expected {expected}, found {found})")]
    TypeMismatch {
        position: Position,
        expected: SmolStr,
        found: SmolStr,
    },

    #[error("{position} Operands must be of integer type: {found}")]
    OperandMustBeInteger { position: Position, found: SmolStr },

    #[error("{position} Operands must be boolean: {found}")]
    OperandMustBeBoolean { position: Position, found: SmolStr },

    #[error("{position} Division by zero")]
    DivisionByZero { position: Position },

    #[error("{position} Arithmetic overflow")]
    ArithmeticOverflow { position: Position },

    #[error("{position} Value {value} is out of range ({min}..={max})")]
    ValueOutOfRange {
        position: Position,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{position} Invalid number: \"{text}\"")]
    InvalidNumber { position: Position, text: SmolStr },
}

impl InterpretingError {
    pub fn position(&self) -> &Position {
        match self {
            Self::UndefinedSymbol { position, .. }
            | Self::EmptyListNotAllowed { position }
            | Self::FirstElementMustBeCallable { position, .. }
            | Self::ArgumentCountMismatch { position, .. }
            | Self::InsufficientArguments { position, .. }
            | Self::CannotBindToNonSymbol { position }
            | Self::ArgumentListMustBeSymbolsOnly { position }
            | Self::NonArithmeticDataType { position, .. }
            | Self::TypeMismatch { position, .. }
            | Self::OperandMustBeInteger { position, .. }
            | Self::OperandMustBeBoolean { position, .. }
            | Self::DivisionByZero { position }
            | Self::ArithmeticOverflow { position }
            | Self::ValueOutOfRange { position, .. }
            | Self::InvalidNumber { position, .. } => position,
        }
    }
}

/// Raised when a symbol id was never handed out by the table asked about it.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("Undefined symbol id {0}")]
pub struct UndefinedSymbolId(pub u32);
