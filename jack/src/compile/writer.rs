//! VM code emission.
use std::{
    fmt,
    io::{self, Write},
};

use log::trace;

/// Receives formatted output, one line at a time.
pub trait Sink {
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards everything written to it.
#[derive(Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn write_line(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Collects lines into the string, each terminated by a newline.
impl Sink for String {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push_str(line);
        self.push('\n');
        Ok(())
    }
}

/// Adapts any [`io::Write`] into a line sink.
pub struct IoSink<W: Write> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.inner, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Memory segments of the target VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constant => write!(f, "constant"),
            Self::Argument => write!(f, "argument"),
            Self::Local    => write!(f, "local"),
            Self::Static   => write!(f, "static"),
            Self::This     => write!(f, "this"),
            Self::That     => write!(f, "that"),
            Self::Pointer  => write!(f, "pointer"),
            Self::Temp     => write!(f, "temp"),
        }
    }
}

/// Arithmetic and logical commands of the target VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Sub => write!(f, "sub"),
            Self::Neg => write!(f, "neg"),
            Self::Eq  => write!(f, "eq"),
            Self::Gt  => write!(f, "gt"),
            Self::Lt  => write!(f, "lt"),
            Self::And => write!(f, "and"),
            Self::Or  => write!(f, "or"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// Formats VM instructions into a sink.
pub struct VmWriter<'a> {
    sink: &'a mut dyn Sink,
}

impl<'a> VmWriter<'a> {
    pub fn new(sink: &'a mut dyn Sink) -> Self {
        Self { sink }
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(format_args!("push {segment} {index}"))
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(format_args!("pop {segment} {index}"))
    }

    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        self.emit(format_args!("{command}"))
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        self.emit(format_args!("label {label}"))
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        self.emit(format_args!("goto {label}"))
    }

    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        self.emit(format_args!("if-goto {label}"))
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        self.emit(format_args!("call {name} {n_args}"))
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        self.emit(format_args!("function {name} {n_locals}"))
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        self.emit(format_args!("return"))
    }

    fn emit(&mut self, instruction: fmt::Arguments) -> io::Result<()> {
        let line = instruction.to_string();
        trace!("{line}");
        self.sink.write_line(&line)
    }
}
