//! XML renderings of the token stream and parse tree.
use std::{borrow::Cow, io};

use super::writer::Sink;
use crate::{error::JackResult, lex::Lexer, tokens::TokenKind};

/// Writes the parse tree of a class as indented XML.
///
/// A disabled writer accepts every call and writes nothing.
pub struct XmlWriter<'a> {
    sink: Option<&'a mut dyn Sink>,
    depth: usize,
}

impl<'a> XmlWriter<'a> {
    pub fn new(sink: &'a mut dyn Sink) -> Self {
        Self {
            sink: Some(sink),
            depth: 0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            depth: 0,
        }
    }

    /// Start element of a non-terminal.
    pub fn open(&mut self, tag: &str) -> io::Result<()> {
        self.line(&format!("<{tag}>"))?;
        self.depth += 1;
        Ok(())
    }

    /// End element of a non-terminal.
    pub fn close(&mut self, tag: &str) -> io::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{tag}>"))
    }

    pub fn terminal(&mut self, kind: TokenKind, fragment: &str) -> io::Result<()> {
        if self.sink.is_none() {
            return Ok(());
        }
        match terminal_element(kind, fragment) {
            Some(element) => self.line(&element),
            None => Ok(()),
        }
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => {
                let indent = "  ".repeat(self.depth);
                sink.write_line(&format!("{indent}{text}"))
            }
            None => Ok(()),
        }
    }
}

/// Write every token of the source as a flat `<tokens>` document.
pub fn write_tokens(source: &str, sink: &mut dyn Sink) -> JackResult<()> {
    let mut lexer = Lexer::new(source);

    sink.write_line("<tokens>")?;
    loop {
        let token = lexer.next_token()?;
        match terminal_element(token.kind, token.fragment(source)) {
            Some(element) => sink.write_line(&element)?,
            None => break,
        }
    }
    sink.write_line("</tokens>")?;

    Ok(())
}

/// XML element for a terminal, `None` for end-of-stream.
fn terminal_element(kind: TokenKind, fragment: &str) -> Option<String> {
    let (tag, text) = match kind {
        TokenKind::Keyword(_) => ("keyword", fragment),
        TokenKind::Symbol(_) => ("symbol", fragment),
        TokenKind::Ident => ("identifier", fragment),
        TokenKind::IntConst(_) => ("integerConstant", fragment),
        TokenKind::StrConst => ("stringConstant", fragment.trim_matches('"')),
        TokenKind::EOS => return None,
    };
    Some(format!("<{tag}> {} </{tag}>", escape(text)))
}

fn escape(text: &str) -> Cow<str> {
    if !text.contains(&['<', '>', '&'][..]) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_tokens() {
        let mut out = String::new();
        write_tokens("if (x < 10) { let s = \"a&b\"; }", &mut out).unwrap();

        let expected = "\
<tokens>
<keyword> if </keyword>
<symbol> ( </symbol>
<identifier> x </identifier>
<symbol> &lt; </symbol>
<integerConstant> 10 </integerConstant>
<symbol> ) </symbol>
<symbol> { </symbol>
<keyword> let </keyword>
<identifier> s </identifier>
<symbol> = </symbol>
<stringConstant> a&amp;b </stringConstant>
<symbol> ; </symbol>
<symbol> } </symbol>
</tokens>
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_nesting() {
        let mut out = String::new();
        {
            let mut xml = XmlWriter::new(&mut out);
            xml.open("statements").unwrap();
            xml.open("returnStatement").unwrap();
            xml.terminal(TokenKind::Symbol(crate::tokens::Symbol::Semicolon), ";")
                .unwrap();
            xml.close("returnStatement").unwrap();
            xml.close("statements").unwrap();
        }

        let expected = "\
<statements>
  <returnStatement>
    <symbol> ; </symbol>
  </returnStatement>
</statements>
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let mut xml = XmlWriter::disabled();
        xml.open("class").unwrap();
        xml.terminal(TokenKind::Ident, "Main").unwrap();
        xml.close("class").unwrap();
    }
}
