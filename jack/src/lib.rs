//! Compiler for the Jack language, targeting the Hack stack VM.
pub mod compile;
pub mod error;
pub mod lex;
pub mod token_stream;
pub mod tokens;

pub mod prelude {
    pub use crate::{
        compile::{Engine, IoSink, NullSink, Sink},
        error::{JackError, JackResult},
    };
}

use compile::{Engine, NullSink, Sink};
use error::JackResult;

/// Compile the source of one class into VM code.
pub fn compile_str(source: &str) -> JackResult<String> {
    let mut out = String::new();
    compile_to(source, &mut out)?;
    Ok(out)
}

/// Compile the source of one class, writing VM code into the sink.
///
/// When compilation fails, the sink holds the code emitted up to the error.
pub fn compile_to(source: &str, sink: &mut dyn Sink) -> JackResult<()> {
    let result = Engine::new(source, sink).compile_class();

    // Flush on failure too, so partial output reaches the writer.
    sink.flush()?;

    result
}

/// Parse the source of one class into an XML document of its parse tree.
pub fn parse_tree_str(source: &str) -> JackResult<String> {
    let mut tree = String::new();
    let mut vm_out = NullSink;
    Engine::new(source, &mut vm_out)
        .with_xml(&mut tree)
        .compile_class()?;
    Ok(tree)
}

/// Render the source's tokens as an XML document.
pub fn tokens_str(source: &str) -> JackResult<String> {
    let mut out = String::new();
    compile::write_tokens(source, &mut out)?;
    Ok(out)
}
