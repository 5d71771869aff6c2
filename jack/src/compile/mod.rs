//! Single pass compilation of a class into VM code.
//!
//! The [`Engine`] recognizes the grammar by recursive descent, and
//! emits code for every production as soon as it's recognized. There
//! is no syntax tree in between. Names are resolved through the
//! [`SymbolTable`] while their declarations are still being read.
pub mod symbol;
pub mod writer;
pub mod xml;

pub use symbol::{DefineError, Entry, Kind, SymbolTable, VarType};
pub use writer::{Command, IoSink, NullSink, Segment, Sink, VmWriter};
pub use xml::{write_tokens, XmlWriter};

use std::fmt;

use log::debug;
use smol_str::SmolStr;

use crate::{
    error::{JackError, JackResult, SemanticError, SemanticErrorKind, SourceLine, SyntaxError},
    lex::Lexer,
    token_stream::TokenStream,
    tokens::{Keyword, Symbol, Token, TokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl fmt::Display for SubroutineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constructor => write!(f, "constructor"),
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(VarType),
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Type(ty) => write!(f, "{ty}"),
        }
    }
}

/// Counters for numbering the labels of control flow statements.
///
/// Labels only need to be unique within one function, so
/// each subroutine starts counting from scratch.
#[derive(Debug, Default)]
struct LabelCounters {
    if_count: u32,
    while_count: u32,
}

/// State of the subroutine currently being compiled.
#[derive(Debug)]
struct Subroutine {
    kind: SubroutineKind,
    return_type: ReturnType,
    /// Fully qualified name, `Class.subroutine`.
    name: String,
    labels: LabelCounters,
}

impl Subroutine {
    fn next_if(&mut self) -> u32 {
        self.labels.if_count += 1;
        self.labels.if_count
    }

    fn next_while(&mut self) -> u32 {
        self.labels.while_count += 1;
        self.labels.while_count
    }
}

/// Code emitted for a binary operator.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Command(Command),
    /// Operators without a VM command are OS library calls.
    Call(&'static str),
}

impl Operation {
    #[rustfmt::skip]
    fn binary(symbol: Symbol) -> Option<Self> {
        match symbol {
            Symbol::Plus    => Some(Self::Command(Command::Add)),
            Symbol::Minus   => Some(Self::Command(Command::Sub)),
            Symbol::Star    => Some(Self::Call("Math.multiply")),
            Symbol::Slash   => Some(Self::Call("Math.divide")),
            Symbol::Amp     => Some(Self::Command(Command::And)),
            Symbol::Pipe    => Some(Self::Command(Command::Or)),
            Symbol::Less    => Some(Self::Command(Command::Lt)),
            Symbol::Greater => Some(Self::Command(Command::Gt)),
            Symbol::Eq      => Some(Self::Command(Command::Eq)),
            _               => None,
        }
    }
}

/// Compiles one class, writing VM code to a sink as it goes.
pub struct Engine<'a> {
    stream: TokenStream<'a>,
    symbols: SymbolTable,
    vm: VmWriter<'a>,
    xml: XmlWriter<'a>,
    class_name: SmolStr,
}

impl<'a> Engine<'a> {
    pub fn new(source_code: &'a str, vm_out: &'a mut dyn Sink) -> Self {
        Self {
            stream: TokenStream::new(Lexer::new(source_code)),
            symbols: SymbolTable::new(),
            vm: VmWriter::new(vm_out),
            xml: XmlWriter::disabled(),
            class_name: SmolStr::default(),
        }
    }

    /// Also write the parse tree as XML while compiling.
    pub fn with_xml(mut self, xml_out: &'a mut dyn Sink) -> Self {
        self.xml = XmlWriter::new(xml_out);
        self
    }

    pub fn class_name(&self) -> &str {
        self.class_name.as_str()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

/// Token helpers
impl<'a> Engine<'a> {
    /// Consume the next token, adding it to the parse tree.
    fn advance(&mut self) -> JackResult<Token> {
        let token = self.stream.next_token()?;
        self.xml.terminal(token.kind, self.stream.fragment(&token))?;
        Ok(token)
    }

    #[inline]
    fn text(&self, token: &Token) -> &'a str {
        self.stream.fragment(token)
    }

    fn next_is_symbol(&mut self, symbol: Symbol) -> JackResult<bool> {
        Ok(self.stream.peek_kind()? == TokenKind::Symbol(symbol))
    }

    fn next_is_keyword(&mut self, keywords: &[Keyword]) -> JackResult<bool> {
        Ok(matches!(
            self.stream.peek_kind()?,
            TokenKind::Keyword(keyword) if keywords.contains(&keyword)
        ))
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> JackResult<Token> {
        if self.next_is_symbol(symbol)? {
            self.advance()
        } else {
            Err(self.syntax_error(format!("symbol '{symbol}'")))
        }
    }

    fn expect_keyword(&mut self, keywords: &[Keyword]) -> JackResult<Keyword> {
        match self.stream.peek_kind()? {
            TokenKind::Keyword(keyword) if keywords.contains(&keyword) => {
                self.advance()?;
                Ok(keyword)
            }
            _ => {
                let names = keywords
                    .iter()
                    .map(|keyword| format!("'{keyword}'"))
                    .collect::<Vec<_>>();
                Err(self.syntax_error(format!("keyword {}", names.join(" or "))))
            }
        }
    }

    fn expect_ident(&mut self) -> JackResult<Token> {
        match self.stream.peek_kind()? {
            TokenKind::Ident => self.advance(),
            _ => Err(self.syntax_error("identifier")),
        }
    }

    /// A primitive type keyword or a class name.
    fn expect_type(&mut self) -> JackResult<VarType> {
        let ty = match self.stream.peek_kind()? {
            TokenKind::Keyword(Keyword::Int) => VarType::Int,
            TokenKind::Keyword(Keyword::Char) => VarType::Char,
            TokenKind::Keyword(Keyword::Boolean) => VarType::Boolean,
            TokenKind::Ident => {
                let token = self.advance()?;
                return Ok(VarType::Class(SmolStr::from(self.text(&token))));
            }
            _ => return Err(self.syntax_error("type")),
        };
        self.advance()?;
        Ok(ty)
    }

    fn define(&mut self, name: &Token, ty: VarType, kind: Kind) -> JackResult<()> {
        let text = self.text(name);
        match self.symbols.define(text, ty, kind) {
            Ok(_) => Ok(()),
            Err(DefineError::Redefinition) => {
                Err(self.semantic_error(SemanticErrorKind::Redefined(text.into()), name))
            }
            Err(DefineError::Overflow) => {
                Err(self.semantic_error(SemanticErrorKind::TooManyVariables(text.into()), name))
            }
        }
    }

    /// Storage location of the variable named by the token.
    fn resolve(&self, name: &Token) -> JackResult<(Segment, u16)> {
        let text = self.text(name);
        match self.symbols.lookup(text) {
            Some(entry) => Ok((entry.kind.segment(), entry.index)),
            None => Err(self.semantic_error(SemanticErrorKind::Undefined(text.into()), name)),
        }
    }

    #[inline(never)]
    #[cold]
    fn syntax_error(&mut self, expected: impl ToString) -> JackError {
        let source = self.stream.source_code();
        let previous = self.stream.previous_token().cloned();

        match self.stream.peek() {
            Ok(token) => {
                let encountered = describe_token(token, source);
                // Running out of tokens is reported where the source stopped making sense.
                let at = match (token.kind, previous) {
                    (TokenKind::EOS, Some(previous)) => previous,
                    _ => token.clone(),
                };
                SyntaxError {
                    expected: expected.to_string(),
                    encountered,
                    line: SourceLine::new(source, at.span, at.line),
                }
                .into()
            }
            Err(err) => err.into(),
        }
    }

    #[inline(never)]
    #[cold]
    fn semantic_error(&self, kind: SemanticErrorKind, token: &Token) -> JackError {
        SemanticError {
            kind,
            line: SourceLine::new(self.stream.source_code(), token.span, token.line),
        }
        .into()
    }
}

fn describe_token(token: &Token, source: &str) -> String {
    match token.kind {
        TokenKind::Ident => format!("identifier '{}'", token.fragment(source)),
        TokenKind::StrConst => format!("string constant {}", token.fragment(source)),
        kind => kind.to_string(),
    }
}

/// Program structure
impl<'a> Engine<'a> {
    /// class := 'class' identifier '{' classVarDec* subroutineDec* '}'
    pub fn compile_class(&mut self) -> JackResult<()> {
        self.xml.open("class")?;

        self.expect_keyword(&[Keyword::Class])?;
        let name = self.expect_ident()?;
        self.class_name = SmolStr::from(self.text(&name));
        debug!("compiling class {}", self.class_name);

        self.expect_symbol(Symbol::LeftBrace)?;
        self.compile_class_var_decs()?;
        self.compile_subroutine_decs()?;
        self.expect_symbol(Symbol::RightBrace)?;

        self.xml.close("class")?;

        // One class per compilation unit.
        if self.stream.peek_kind()? != TokenKind::EOS {
            return Err(self.syntax_error("end-of-stream"));
        }

        Ok(())
    }

    /// classVarDec := ('static'|'field') type identifier (',' identifier)* ';'
    fn compile_class_var_decs(&mut self) -> JackResult<()> {
        const STARTS: [Keyword; 2] = [Keyword::Static, Keyword::Field];

        while self.next_is_keyword(&STARTS)? {
            self.xml.open("classVarDec")?;

            let kind = match self.expect_keyword(&STARTS)? {
                Keyword::Static => Kind::Static,
                _ => Kind::Field,
            };
            let ty = self.expect_type()?;
            self.compile_var_names(ty, kind)?;

            self.xml.close("classVarDec")?;
        }

        Ok(())
    }

    /// Comma separated names sharing one declared type, up to the closing `;`.
    fn compile_var_names(&mut self, ty: VarType, kind: Kind) -> JackResult<()> {
        loop {
            let name = self.expect_ident()?;
            self.define(&name, ty.clone(), kind)?;

            if !self.next_is_symbol(Symbol::Comma)? {
                break;
            }
            self.advance()?;
        }

        self.expect_symbol(Symbol::Semicolon)?;
        Ok(())
    }

    /// subroutineDec := ('constructor'|'function'|'method') ('void'|type) identifier
    ///                  '(' parameterList ')' subroutineBody
    fn compile_subroutine_decs(&mut self) -> JackResult<()> {
        const STARTS: [Keyword; 3] = [Keyword::Constructor, Keyword::Function, Keyword::Method];

        while self.next_is_keyword(&STARTS)? {
            self.xml.open("subroutineDec")?;

            let kind = match self.expect_keyword(&STARTS)? {
                Keyword::Constructor => SubroutineKind::Constructor,
                Keyword::Function => SubroutineKind::Function,
                _ => SubroutineKind::Method,
            };
            let return_type = if self.next_is_keyword(&[Keyword::Void])? {
                self.advance()?;
                ReturnType::Void
            } else {
                ReturnType::Type(self.expect_type()?)
            };
            let name = self.expect_ident()?;

            let mut subroutine = Subroutine {
                kind,
                return_type,
                name: format!("{}.{}", self.class_name, self.text(&name)),
                labels: LabelCounters::default(),
            };
            debug!(
                "compiling {} {} {}",
                subroutine.kind, subroutine.return_type, subroutine.name
            );

            self.symbols.start_subroutine();

            self.expect_symbol(Symbol::LeftParen)?;
            self.compile_parameter_list(subroutine.kind)?;
            self.expect_symbol(Symbol::RightParen)?;
            self.compile_subroutine_body(&mut subroutine)?;

            self.xml.close("subroutineDec")?;
        }

        Ok(())
    }

    /// parameterList := (type identifier (',' type identifier)*)?
    fn compile_parameter_list(&mut self, kind: SubroutineKind) -> JackResult<()> {
        self.xml.open("parameterList")?;

        if kind == SubroutineKind::Method {
            // The receiver is passed as a hidden first argument.
            let receiver = self.symbols.define(
                "this",
                VarType::Class(self.class_name.clone()),
                Kind::Argument,
            );
            debug_assert_eq!(receiver, Ok(0));
        }

        if !self.next_is_symbol(Symbol::RightParen)? {
            loop {
                let ty = self.expect_type()?;
                let name = self.expect_ident()?;
                self.define(&name, ty, Kind::Argument)?;

                if !self.next_is_symbol(Symbol::Comma)? {
                    break;
                }
                self.advance()?;
            }
        }

        self.xml.close("parameterList")?;
        Ok(())
    }

    /// subroutineBody := '{' varDec* statements '}'
    fn compile_subroutine_body(&mut self, subroutine: &mut Subroutine) -> JackResult<()> {
        self.xml.open("subroutineBody")?;
        self.expect_symbol(Symbol::LeftBrace)?;

        while self.next_is_keyword(&[Keyword::Var])? {
            self.compile_var_dec()?;
        }

        // Locals are only known once every declaration has been read.
        let n_locals = self.symbols.count(Kind::Local);
        self.vm.write_function(&subroutine.name, n_locals)?;

        match subroutine.kind {
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.count(Kind::Field);
                self.vm.write_push(Segment::Constant, n_fields)?;
                self.vm.write_call("Memory.alloc", 1)?;
                self.vm.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.vm.write_push(Segment::Argument, 0)?;
                self.vm.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements(subroutine)?;

        self.expect_symbol(Symbol::RightBrace)?;
        self.xml.close("subroutineBody")?;
        Ok(())
    }

    /// varDec := 'var' type identifier (',' identifier)* ';'
    fn compile_var_dec(&mut self) -> JackResult<()> {
        self.xml.open("varDec")?;

        self.expect_keyword(&[Keyword::Var])?;
        let ty = self.expect_type()?;
        self.compile_var_names(ty, Kind::Local)?;

        self.xml.close("varDec")?;
        Ok(())
    }
}

/// Statements
impl<'a> Engine<'a> {
    fn compile_statements(&mut self, subroutine: &mut Subroutine) -> JackResult<()> {
        self.xml.open("statements")?;

        loop {
            match self.stream.peek_kind()? {
                TokenKind::Keyword(Keyword::Let) => self.compile_let()?,
                TokenKind::Keyword(Keyword::If) => self.compile_if(subroutine)?,
                TokenKind::Keyword(Keyword::While) => self.compile_while(subroutine)?,
                TokenKind::Keyword(Keyword::Do) => self.compile_do()?,
                TokenKind::Keyword(Keyword::Return) => self.compile_return()?,
                _ => break,
            }
        }

        self.xml.close("statements")?;
        Ok(())
    }

    /// letStatement := 'let' identifier ('[' expression ']')? '=' expression ';'
    fn compile_let(&mut self) -> JackResult<()> {
        self.xml.open("letStatement")?;

        self.expect_keyword(&[Keyword::Let])?;
        let name = self.expect_ident()?;
        let (segment, index) = self.resolve(&name)?;

        if self.next_is_symbol(Symbol::LeftBracket)? {
            // Target address is base plus offset.
            self.vm.write_push(segment, index)?;
            self.advance()?;
            self.compile_expression()?;
            self.expect_symbol(Symbol::RightBracket)?;
            self.vm.write_arithmetic(Command::Add)?;

            self.expect_symbol(Symbol::Eq)?;
            self.compile_expression()?;

            // The right hand side may itself have moved `that`, so
            // the address is only loaded into it after evaluation.
            self.vm.write_pop(Segment::Temp, 0)?;
            self.vm.write_pop(Segment::Pointer, 1)?;
            self.vm.write_push(Segment::Temp, 0)?;
            self.vm.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol(Symbol::Eq)?;
            self.compile_expression()?;
            self.vm.write_pop(segment, index)?;
        }

        self.expect_symbol(Symbol::Semicolon)?;

        self.xml.close("letStatement")?;
        Ok(())
    }

    /// ifStatement := 'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?
    fn compile_if(&mut self, subroutine: &mut Subroutine) -> JackResult<()> {
        self.xml.open("ifStatement")?;

        self.expect_keyword(&[Keyword::If])?;

        let n = subroutine.next_if();
        let label_else = format!("ELSE_{n}");
        let label_end = format!("ENDIF_{n}");

        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightParen)?;

        self.vm.write_arithmetic(Command::Not)?;
        self.vm.write_if(&label_else)?;

        self.expect_symbol(Symbol::LeftBrace)?;
        self.compile_statements(subroutine)?;
        self.expect_symbol(Symbol::RightBrace)?;

        self.vm.write_goto(&label_end)?;
        self.vm.write_label(&label_else)?;

        if self.next_is_keyword(&[Keyword::Else])? {
            self.advance()?;
            self.expect_symbol(Symbol::LeftBrace)?;
            self.compile_statements(subroutine)?;
            self.expect_symbol(Symbol::RightBrace)?;
        }

        self.vm.write_label(&label_end)?;

        self.xml.close("ifStatement")?;
        Ok(())
    }

    /// whileStatement := 'while' '(' expression ')' '{' statements '}'
    fn compile_while(&mut self, subroutine: &mut Subroutine) -> JackResult<()> {
        self.xml.open("whileStatement")?;

        self.expect_keyword(&[Keyword::While])?;

        let n = subroutine.next_while();
        let label_loop = format!("WHILE_{n}");
        let label_end = format!("ENDWHILE_{n}");

        self.vm.write_label(&label_loop)?;

        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightParen)?;

        self.vm.write_arithmetic(Command::Not)?;
        self.vm.write_if(&label_end)?;

        self.expect_symbol(Symbol::LeftBrace)?;
        self.compile_statements(subroutine)?;
        self.expect_symbol(Symbol::RightBrace)?;

        self.vm.write_goto(&label_loop)?;
        self.vm.write_label(&label_end)?;

        self.xml.close("whileStatement")?;
        Ok(())
    }

    /// doStatement := 'do' subroutineCall ';'
    fn compile_do(&mut self) -> JackResult<()> {
        self.xml.open("doStatement")?;

        self.expect_keyword(&[Keyword::Do])?;
        let name = self.expect_ident()?;
        self.compile_subroutine_call(&name)?;

        // Discard the return value.
        self.vm.write_pop(Segment::Temp, 0)?;

        self.expect_symbol(Symbol::Semicolon)?;

        self.xml.close("doStatement")?;
        Ok(())
    }

    /// returnStatement := 'return' expression? ';'
    fn compile_return(&mut self) -> JackResult<()> {
        self.xml.open("returnStatement")?;

        self.expect_keyword(&[Keyword::Return])?;

        if self.next_is_symbol(Symbol::Semicolon)? {
            // Callers always pop a value, even from void subroutines.
            self.vm.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.vm.write_return()?;

        self.expect_symbol(Symbol::Semicolon)?;

        self.xml.close("returnStatement")?;
        Ok(())
    }
}

/// Expressions
impl<'a> Engine<'a> {
    /// expression := term (op term)*
    ///
    /// Operators have no precedence, and are applied left to right.
    fn compile_expression(&mut self) -> JackResult<()> {
        self.xml.open("expression")?;

        self.compile_term()?;

        while let Some(operation) = self.peek_operation()? {
            self.advance()?;
            self.compile_term()?;

            match operation {
                Operation::Command(command) => self.vm.write_arithmetic(command)?,
                Operation::Call(name) => self.vm.write_call(name, 2)?,
            }
        }

        self.xml.close("expression")?;
        Ok(())
    }

    fn peek_operation(&mut self) -> JackResult<Option<Operation>> {
        match self.stream.peek_kind()? {
            TokenKind::Symbol(symbol) => Ok(Operation::binary(symbol)),
            _ => Ok(None),
        }
    }

    fn compile_term(&mut self) -> JackResult<()> {
        self.xml.open("term")?;

        match self.stream.peek_kind()? {
            TokenKind::IntConst(value) => {
                self.advance()?;
                self.vm.write_push(Segment::Constant, value)?;
            }
            TokenKind::StrConst => {
                let token = self.advance()?;
                self.compile_string(&token)?;
            }
            TokenKind::Keyword(Keyword::True) => {
                // All bits set.
                self.advance()?;
                self.vm.write_push(Segment::Constant, 0)?;
                self.vm.write_arithmetic(Command::Not)?;
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.advance()?;
                self.vm.write_push(Segment::Constant, 0)?;
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance()?;
                self.vm.write_push(Segment::Pointer, 0)?;
            }
            TokenKind::Ident => self.compile_identifier_term()?,
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(Symbol::RightParen)?;
            }
            TokenKind::Symbol(Symbol::Minus) => {
                self.advance()?;
                self.compile_term()?;
                self.vm.write_arithmetic(Command::Neg)?;
            }
            TokenKind::Symbol(Symbol::Tilde) => {
                self.advance()?;
                self.compile_term()?;
                self.vm.write_arithmetic(Command::Not)?;
            }
            _ => return Err(self.syntax_error("term")),
        }

        self.xml.close("term")?;
        Ok(())
    }

    /// Builds a `String` object, one character at a time.
    fn compile_string(&mut self, token: &Token) -> JackResult<()> {
        let literal = self.text(token);
        let text = literal
            .strip_prefix('"')
            .and_then(|text| text.strip_suffix('"'))
            .unwrap_or(literal);

        // The lexer bounds both the length and the character codes to 0..=32767.
        self.vm
            .write_push(Segment::Constant, text.chars().count() as u16)?;
        self.vm.write_call("String.new", 1)?;

        for c in text.chars() {
            self.vm.write_push(Segment::Constant, u32::from(c) as u16)?;
            self.vm.write_call("String.appendChar", 2)?;
        }

        Ok(())
    }

    /// Variable, array element, or subroutine call.
    ///
    /// Needs a second token of look ahead to tell them apart.
    fn compile_identifier_term(&mut self) -> JackResult<()> {
        let after_name = self.stream.peek_second()?.kind;

        match after_name {
            TokenKind::Symbol(Symbol::LeftBracket) => {
                let name = self.expect_ident()?;
                let (segment, index) = self.resolve(&name)?;

                self.vm.write_push(segment, index)?;
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(Symbol::RightBracket)?;
                self.vm.write_arithmetic(Command::Add)?;

                self.vm.write_pop(Segment::Pointer, 1)?;
                self.vm.write_push(Segment::That, 0)?;
            }
            TokenKind::Symbol(Symbol::LeftParen) | TokenKind::Symbol(Symbol::Dot) => {
                let name = self.expect_ident()?;
                self.compile_subroutine_call(&name)?;
            }
            _ => {
                let name = self.expect_ident()?;
                let (segment, index) = self.resolve(&name)?;
                self.vm.write_push(segment, index)?;
            }
        }

        Ok(())
    }

    /// subroutineCall := identifier '(' expressionList ')'
    ///                 | identifier '.' identifier '(' expressionList ')'
    ///
    /// The leading identifier has already been consumed.
    fn compile_subroutine_call(&mut self, first: &Token) -> JackResult<()> {
        let first_name = self.text(first);
        let mut n_args: usize = 0;

        let callee = if self.next_is_symbol(Symbol::Dot)? {
            self.advance()?;
            let subroutine = self.expect_ident()?;
            let subroutine_name = self.text(&subroutine);

            match self.symbols.lookup(first_name) {
                Some(entry) => {
                    // Method on the object held by a variable. It's dispatched
                    // through the variable's declared type.
                    let class_name = entry.ty.to_string();
                    self.vm.write_push(entry.kind.segment(), entry.index)?;
                    n_args += 1;
                    format!("{class_name}.{subroutine_name}")
                }
                // Not a variable, so it names a class.
                None => format!("{first_name}.{subroutine_name}"),
            }
        } else {
            // Unqualified calls are methods on the current object.
            self.vm.write_push(Segment::Pointer, 0)?;
            n_args += 1;
            format!("{}.{first_name}", self.class_name)
        };

        self.expect_symbol(Symbol::LeftParen)?;
        n_args += self.compile_expression_list()?;
        self.expect_symbol(Symbol::RightParen)?;

        let n_args = u16::try_from(n_args).map_err(|_| {
            self.semantic_error(SemanticErrorKind::TooManyArguments(callee.as_str().into()), first)
        })?;
        self.vm.write_call(&callee, n_args)?;
        Ok(())
    }

    /// expressionList := (expression (',' expression)*)?
    ///
    /// Returns the number of expressions.
    fn compile_expression_list(&mut self) -> JackResult<usize> {
        self.xml.open("expressionList")?;

        let mut count = 0;
        if !self.next_is_symbol(Symbol::RightParen)? {
            self.compile_expression()?;
            count += 1;

            while self.next_is_symbol(Symbol::Comma)? {
                self.advance()?;
                self.compile_expression()?;
                count += 1;
            }
        }

        self.xml.close("expressionList")?;
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn compile(source: &str) -> String {
        let mut out = String::new();
        Engine::new(source, &mut out).compile_class().unwrap();
        out
    }

    #[test]
    fn test_binary_operations() {
        assert!(matches!(
            Operation::binary(Symbol::Plus),
            Some(Operation::Command(Command::Add))
        ));
        assert!(matches!(
            Operation::binary(Symbol::Slash),
            Some(Operation::Call("Math.divide"))
        ));
        assert!(Operation::binary(Symbol::Tilde).is_none());
        assert!(Operation::binary(Symbol::Semicolon).is_none());
    }

    #[test]
    fn test_empty_class() {
        assert_eq!(compile("class Empty { }"), "");
    }

    #[test]
    fn test_constructor_prologue() {
        let out = compile(
            "class P { field int a, b, c; static int s; constructor P new() { return this; } }",
        );
        assert_eq!(
            out,
            "function P.new 0\npush constant 3\ncall Memory.alloc 1\npop pointer 0\npush pointer 0\nreturn\n"
        );
    }

    #[test]
    fn test_locals_counted_before_function() {
        let out = compile("class L { function void f() { var int a, b; var char c; return; } }");
        assert!(out.starts_with("function L.f 3\n"));
    }

    #[test]
    fn test_syntax_error_reports_expected_keywords() {
        let mut out = String::new();
        let err = Engine::new("klass A { }", &mut out)
            .compile_class()
            .unwrap_err();

        match err {
            JackError::Syntax(err) => {
                assert_eq!(err.expected, "keyword 'class'");
                assert_eq!(err.encountered, "identifier 'klass'");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
