//! Buffered stream of tokens for look ahead.
use crate::{
    error::LexError,
    lex::Lexer,
    tokens::{Token, TokenKind},
};

use itertools::{multipeek, MultiPeek};

/// Buffered stream of tokens that allows arbitrary look ahead.
///
/// Tokens are lazily lexed. Peeking or consuming the next token
/// triggers the internal lexer.
///
/// The peek semantics are determined by the internal `MultiPeek`,
/// which advances a peek cursor on every call. The methods here
/// reset that cursor themselves, so `peek` always returns the next
/// token and `peek_second` the one after it.
pub struct TokenStream<'a> {
    lexer: MultiPeek<Lexer<'a>>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// A copy of the previous token.
    prev: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer: multipeek(lexer),
            prev: None,
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// The most recently consumed token.
    pub fn previous_token(&self) -> Option<&Token> {
        self.prev.as_ref()
    }

    /// Helper function to extract the token's string fragment
    /// from the original source code.
    #[inline]
    pub fn fragment(&self, token: &Token) -> &'a str {
        token.span.fragment(self.original)
    }

    /// Consumes the current token regardless of kind.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.lexer.next() {
            Some(Ok(token)) => {
                self.prev = Some(token.clone());
                Ok(token)
            }
            Some(Err(err)) => Err(err),
            None => unreachable!("lexer yields end-of-stream indefinitely"),
        }
    }

    /// Return the current token without advancing the cursor.
    pub fn peek(&mut self) -> Result<&Token, LexError> {
        self.lexer.reset_peek();
        match self.lexer.peek() {
            Some(result) => result.as_ref().map_err(LexError::clone),
            None => unreachable!("lexer yields end-of-stream indefinitely"),
        }
    }

    /// Return the token after the current one without advancing the cursor.
    pub fn peek_second(&mut self) -> Result<&Token, LexError> {
        self.lexer.reset_peek();
        if let Some(Err(err)) = self.lexer.peek() {
            return Err(err.clone());
        }

        match self.lexer.peek() {
            Some(result) => result.as_ref().map_err(LexError::clone),
            None => unreachable!("lexer yields end-of-stream indefinitely"),
        }
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&mut self) -> Result<TokenKind, LexError> {
        self.peek().map(|token| token.kind)
    }
}
