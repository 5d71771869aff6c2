//! Tokens

use std::fmt;

#[derive(Debug, Clone)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    /// 1-based line number where the token starts.
    pub line: usize,
}

impl Token {
    #[inline]
    pub fn fragment<'a>(&self, source: &'a str) -> &'a str {
        self.span.fragment(source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// Single character punctuation or operator
    Symbol(Symbol),
    Ident,
    /// Integer literal, already range checked.
    IntConst(u16),
    /// String literal, including its quotes.
    StrConst,

    // ------------------------------------------------------------------------
    // Special
    /// End-of-stream
    EOS,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "keyword '{keyword}'"),
            Self::Symbol(symbol) => write!(f, "symbol '{symbol}'"),
            Self::Ident => write!(f, "identifier"),
            Self::IntConst(value) => write!(f, "integer constant {value}"),
            Self::StrConst => write!(f, "string constant"),
            Self::EOS => write!(f, "end-of-stream"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,

    // ------------------------------------------------------------------------
    // Types
    Int,
    Char,
    Boolean,
    Void,

    // ------------------------------------------------------------------------
    // Constants
    True,
    False,
    Null,
    This,

    // ------------------------------------------------------------------------
    // Statements
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    /// Every keyword, used by the lexer to find the longest keyword prefix.
    pub const ALL: [Keyword; 21] = [
        Self::Class,
        Self::Constructor,
        Self::Function,
        Self::Method,
        Self::Field,
        Self::Static,
        Self::Var,
        Self::Int,
        Self::Char,
        Self::Boolean,
        Self::Void,
        Self::True,
        Self::False,
        Self::Null,
        Self::This,
        Self::Let,
        Self::Do,
        Self::If,
        Self::Else,
        Self::While,
        Self::Return,
    ];

    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref();
        Self::ALL.into_iter().find(|keyword| keyword.as_str() == text)
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Symbol {
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Amp,          // &
    Pipe,         // |
    Less,         // <
    Greater,      // >
    Eq,           // =
    Tilde,        // ~
}

impl Symbol {
    #[rustfmt::skip]
    pub fn parse(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::LeftBrace),
            '}' => Some(Self::RightBrace),
            '(' => Some(Self::LeftParen),
            ')' => Some(Self::RightParen),
            '[' => Some(Self::LeftBracket),
            ']' => Some(Self::RightBracket),
            '.' => Some(Self::Dot),
            ',' => Some(Self::Comma),
            ';' => Some(Self::Semicolon),
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '*' => Some(Self::Star),
            '/' => Some(Self::Slash),
            '&' => Some(Self::Amp),
            '|' => Some(Self::Pipe),
            '<' => Some(Self::Less),
            '>' => Some(Self::Greater),
            '=' => Some(Self::Eq),
            '~' => Some(Self::Tilde),
            _   => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_char(&self) -> char {
        match self {
            Self::LeftBrace    => '{',
            Self::RightBrace   => '}',
            Self::LeftParen    => '(',
            Self::RightParen   => ')',
            Self::LeftBracket  => '[',
            Self::RightBracket => ']',
            Self::Dot          => '.',
            Self::Comma        => ',',
            Self::Semicolon    => ';',
            Self::Plus         => '+',
            Self::Minus        => '-',
            Self::Star         => '*',
            Self::Slash        => '/',
            Self::Amp          => '&',
            Self::Pipe         => '|',
            Self::Less         => '<',
            Self::Greater      => '>',
            Self::Eq           => '=',
            Self::Tilde        => '~',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

const LINE_BREAKS: &[char] = &['\n', '\r'];

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.end() as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }

    /// The full line of text the span starts on, without its line terminator.
    pub fn surrounding_line<'a>(&self, text: &'a str) -> &'a str {
        let index = (self.index as usize).min(text.len());
        let start = text[..index]
            .rfind(LINE_BREAKS)
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = text[index..]
            .find(LINE_BREAKS)
            .map(|i| index + i)
            .unwrap_or(text.len());

        &text[start..end]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_span_fragment() {
        const CODE: &str = "let x = 42;";

        let spans = &[
            Span::new(0, 3), // let
            Span::new(4, 1), // x
            Span::new(6, 1), // =
            Span::new(8, 2), // 42
        ];

        assert_eq!(spans[0].fragment(CODE), "let");
        assert_eq!(spans[1].fragment(CODE), "x");
        assert_eq!(spans[2].fragment(CODE), "=");
        assert_eq!(spans[3].fragment(CODE), "42");
    }

    #[test]
    fn test_span_surrounding_line() {
        const CODE: &str = "------------\n....here....\n------------";

        let span = Span::new(17, 4);
        assert_eq!(span.fragment(CODE), "here");
        assert_eq!(span.surrounding_line(CODE), "....here....");
    }

    #[test]
    fn test_span_surrounding_line_crlf() {
        const CODE: &str = "------------\r\n....here....\r\n------------";

        let span = Span::new(18, 4);
        assert_eq!(span.fragment(CODE), "here");
        assert_eq!(span.surrounding_line(CODE), "....here....");
    }

    #[test]
    fn test_span_surrounding_full_text() {
        const CODE: &str = "....here....";

        let span = Span::new(4, 4);
        assert_eq!(span.surrounding_line(CODE), "....here....");
    }

    #[test]
    fn test_keyword_parse() {
        assert_eq!(Keyword::parse("constructor"), Some(Keyword::Constructor));
        assert_eq!(Keyword::parse("boolean"), Some(Keyword::Boolean));
        assert_eq!(Keyword::parse("Class"), None);
        assert_eq!(Keyword::parse("classy"), None);
    }
}
