//! Lexical analysis (tokenizer)
use crate::{
    error::{LexError, LexErrorKind, SourceLine},
    tokens::{Keyword, Span, Symbol, Token, TokenKind},
};

/// Largest value an integer constant may hold.
pub const MAX_INT: u16 = 32767;

/// Lexical analyzer.
///
/// Tokens are produced lazily, one per call to [`Lexer::next_token`].
/// Each call tries every rule in [`RULES`] against the remaining source,
/// and keeps the longest match. Comments, whitespace and line breaks
/// are matched the same way, then skipped.
pub struct Lexer<'a> {
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Byte offset of the remaining source.
    offset: usize,
    /// Current 1-based line number.
    line: usize,
    /// Set once the end-of-stream token has been produced.
    done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Keyword,
    Symbol,
    Ident,
    StrConst,
    IntConst,
    LineComment,
    BlockComment,
    Whitespace,
    Newline,
}

/// Returns the byte length of the match at the start of the input.
type Matcher = fn(&str) -> Option<usize>;

/// Lexical rules in priority order. When two rules match the same
/// number of bytes, the earlier rule wins.
#[rustfmt::skip]
const RULES: [(Rule, Matcher); 9] = [
    (Rule::Keyword,      match_keyword),
    (Rule::Symbol,       match_symbol),
    (Rule::Ident,        match_ident),
    (Rule::StrConst,     match_string),
    (Rule::IntConst,     match_int),
    (Rule::LineComment,  match_line_comment),
    (Rule::BlockComment, match_block_comment),
    (Rule::Whitespace,   match_whitespace),
    (Rule::Newline,      match_newline),
];

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            original: source_code,
            offset: 0,
            line: 1,
            done: false,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Indicates whether the end-of-stream token is still to come.
    pub fn has_more(&self) -> bool {
        !self.done
    }

    /// Restart tokenizing from the beginning of the source.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.done = false;
    }

    /// Scan the source and construct the next token.
    ///
    /// Once the source is exhausted, every call returns an end-of-stream token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let rest = &self.original[self.offset..];

            if rest.is_empty() {
                self.done = true;
                return Ok(self.make_token(TokenKind::EOS, 0));
            }

            let (rule, size) = match longest_match(rest) {
                Some(found) => found,
                None if rest.starts_with('"') => {
                    return Err(self.error(LexErrorKind::UnterminatedString))
                }
                None => {
                    let c = rest.chars().next().unwrap_or('\0');
                    return Err(self.error(LexErrorKind::Unrecognized(c)));
                }
            };

            // A block comment that never closes would otherwise
            // fall through to a slash symbol.
            if rule != Rule::BlockComment && rest.starts_with("/*") {
                return Err(self.error(LexErrorKind::UnterminatedComment));
            }

            let fragment = &rest[..size];

            match rule {
                Rule::Keyword | Rule::Ident => {
                    let kind = Keyword::parse(fragment)
                        .map(TokenKind::Keyword)
                        .unwrap_or(TokenKind::Ident);
                    return Ok(self.make_token(kind, size));
                }
                Rule::Symbol => {
                    let c = fragment.chars().next().unwrap_or('\0');
                    return match Symbol::parse(c) {
                        Some(symbol) => Ok(self.make_token(TokenKind::Symbol(symbol), size)),
                        None => Err(self.error(LexErrorKind::Unrecognized(c))),
                    };
                }
                Rule::StrConst => {
                    // The length and each character become constants in the generated code.
                    let text = &fragment[1..fragment.len() - 1];
                    if let Some(c) = text.chars().find(|c| u32::from(*c) > u32::from(MAX_INT)) {
                        return Err(self.error(LexErrorKind::CharacterRange(c)));
                    }
                    if text.chars().count() > usize::from(MAX_INT) {
                        return Err(self.error(LexErrorKind::StringLength));
                    }
                    return Ok(self.make_token(TokenKind::StrConst, size));
                }
                Rule::IntConst => {
                    return match fragment.parse::<u16>() {
                        Ok(value) if value <= MAX_INT => {
                            Ok(self.make_token(TokenKind::IntConst(value), size))
                        }
                        _ => Err(self.error(LexErrorKind::IntegerRange(fragment.to_owned()))),
                    };
                }
                Rule::LineComment | Rule::BlockComment | Rule::Whitespace | Rule::Newline => {
                    self.line += count_line_breaks(fragment);
                    self.offset += size;
                }
            }
        }
    }

    /// Build a token at the current offset, and move past it.
    fn make_token(&mut self, kind: TokenKind, size: usize) -> Token {
        let token = Token {
            span: Span::new(self.offset as u32, size as u32),
            kind,
            line: self.line,
        };
        self.offset += size;
        token
    }

    #[inline(never)]
    #[cold]
    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            line: SourceLine::new(self.original, Span::new(self.offset as u32, 0), self.line),
        }
    }
}

/// Implement `Lexer` as an iterator for consuming tokens lazily.
///
/// The iterator never ends on its own; it keeps yielding
/// end-of-stream tokens, so callers stop on [`TokenKind::EOS`].
impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_token())
    }
}

fn longest_match(rest: &str) -> Option<(Rule, usize)> {
    let mut best: Option<(Rule, usize)> = None;

    for (rule, matcher) in RULES {
        if let Some(size) = matcher(rest) {
            if best.map_or(true, |(_, best_size)| size > best_size) {
                best = Some((rule, size));
            }
        }
    }

    best
}

fn match_keyword(rest: &str) -> Option<usize> {
    Keyword::ALL
        .iter()
        .map(Keyword::as_str)
        .filter(|keyword| rest.starts_with(*keyword))
        .map(str::len)
        .max()
}

fn match_symbol(rest: &str) -> Option<usize> {
    rest.chars().next().and_then(Symbol::parse).map(|_| 1)
}

fn match_ident(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();

    match chars.next() {
        Some((_, c)) if is_letter(c) => {}
        _ => return None,
    }

    let end = chars
        .find(|(_, c)| !is_letter_or_digit(*c))
        .map(|(index, _)| index)
        .unwrap_or(rest.len());
    Some(end)
}

/// String literals may not contain line breaks. The first quote
/// after the opening one always closes the literal.
fn match_string(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('"')?;
    let end = body.find(&['"', '\n', '\r'][..])?;

    if body[end..].starts_with('"') {
        Some(end + 2)
    } else {
        None
    }
}

/// Digits that run into letters do not form a number.
fn match_int(rest: &str) -> Option<usize> {
    let end = rest.find(|c: char| !is_digit(c)).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    match rest[end..].chars().next() {
        Some(c) if is_letter(c) => None,
        _ => Some(end),
    }
}

fn match_line_comment(rest: &str) -> Option<usize> {
    if rest.starts_with("//") {
        Some(rest.find(&['\n', '\r'][..]).unwrap_or(rest.len()))
    } else {
        None
    }
}

fn match_block_comment(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix("/*")?;
    body.find("*/").map(|end| end + 4)
}

fn match_whitespace(rest: &str) -> Option<usize> {
    let end = rest.find(|c: char| !is_whitespace(c)).unwrap_or(rest.len());
    (end > 0).then_some(end)
}

fn match_newline(rest: &str) -> Option<usize> {
    if rest.starts_with("\r\n") {
        Some(2)
    } else if rest.starts_with(&['\n', '\r'][..]) {
        Some(1)
    } else {
        None
    }
}

/// Number of line breaks in the text, counting `\r\n` once.
fn count_line_breaks(text: &str) -> usize {
    let mut count = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                count += 1;
            }
            '\n' => count += 1,
            _ => {}
        }
    }

    count
}

fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0020}' // space
            | '\u{0009}' // tab
            | '\u{000C}' // form feed
            | '\u{FEFF}' // zero width no-break space
    )
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || is_digit(c)
}
