//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
    string::FromUtf8Error,
};

use smol_str::SmolStr;

use crate::tokens::Span;

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    Lex(LexError),
    Syntax(SyntaxError),
    Semantic(SemanticError),
    Io(io::Error),
    Utf8(FromUtf8Error),
}

impl JackError {
    /// The offending line of source, when the error came from compiling it.
    pub fn source_line(&self) -> Option<&SourceLine> {
        match self {
            Self::Lex(err) => Some(&err.line),
            Self::Syntax(err) => Some(&err.line),
            Self::Semantic(err) => Some(&err.line),
            Self::Io(_) | Self::Utf8(_) => None,
        }
    }
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Syntax(err) => write!(f, "{err}"),
            Self::Semantic(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Utf8(err) => write!(f, "source is not valid UTF-8: {err}"),
        }
    }
}

impl std::error::Error for JackError {}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

impl From<SyntaxError> for JackError {
    fn from(err: SyntaxError) -> Self {
        JackError::Syntax(err)
    }
}

impl From<SemanticError> for JackError {
    fn from(err: SemanticError) -> Self {
        JackError::Semantic(err)
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<FromUtf8Error> for JackError {
    fn from(err: FromUtf8Error) -> Self {
        JackError::Utf8(err)
    }
}

/// Line of source code that an error points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number.
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new(source: &str, span: Span, number: usize) -> Self {
        Self {
            number,
            text: span.surrounding_line(source).to_owned(),
        }
    }
}

impl Display for SourceLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}: {}", self.number, self.text)
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: SourceLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// No lexical rule matches the remaining input.
    Unrecognized(char),
    /// Integer literal outside of `0..=32767`.
    IntegerRange(String),
    /// String literal hits a line break before its closing quote.
    UnterminatedString,
    UnterminatedComment,
    /// Character in a string literal with a code above `32767`.
    CharacterRange(char),
    /// String literal with more than `32767` characters.
    StringLength,
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.line)?;
        match &self.kind {
            LexErrorKind::Unrecognized(c) => write!(f, "couldn't find a token at {c:?}"),
            LexErrorKind::IntegerRange(text) => {
                write!(f, "integer constant {text} is out of range 0..=32767")
            }
            LexErrorKind::UnterminatedString => write!(f, "unterminated string constant"),
            LexErrorKind::UnterminatedComment => write!(f, "unterminated block comment"),
            LexErrorKind::CharacterRange(c) => {
                write!(f, "character {c:?} in string constant is out of range 0..=32767")
            }
            LexErrorKind::StringLength => {
                write!(f, "string constant is longer than 32767 characters")
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Error returned when the next token doesn't fit the production being compiled.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    /// Description of the acceptable tokens.
    pub expected: String,
    /// Description of the token that was found instead.
    pub encountered: String,
    pub line: SourceLine,
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.line)?;
        write!(
            f,
            "expected {} but encountered {}",
            self.expected, self.encountered
        )
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub line: SourceLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    /// Identifier is not declared in either scope.
    Undefined(SmolStr),
    /// Identifier is declared twice in the same scope.
    Redefined(SmolStr),
    /// Declaration would need an index beyond `u16::MAX`.
    TooManyVariables(SmolStr),
    /// Call passes more arguments than fit in a `call` instruction.
    TooManyArguments(SmolStr),
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.line)?;
        match &self.kind {
            SemanticErrorKind::Undefined(name) => write!(f, "undefined variable: {name}"),
            SemanticErrorKind::Redefined(name) => write!(f, "variable already defined: {name}"),
            SemanticErrorKind::TooManyVariables(name) => {
                write!(f, "too many variables of the same kind to define: {name}")
            }
            SemanticErrorKind::TooManyArguments(name) => {
                write!(f, "too many arguments in call to: {name}")
            }
        }
    }
}

impl std::error::Error for SemanticError {}
