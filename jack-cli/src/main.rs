//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    fs,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    time::Instant,
};

use jack::{
    compile::{Engine, IoSink, NullSink, Sink},
    error::JackResult,
};
use log::{debug, error, info};

static USAGE: &str = r#"
usage: jackc CMD PATH

commands:
    compile     Compile a .jack file, or every .jack file in a directory,
                into a .vm file next to each source
    tokens      Print the tokens of a .jack file as XML
    tree        Print the parse tree of a .jack file as XML

environment:
    RUST_LOG    Log level filter, eg. debug or trace

examples:
    jackc compile Main.jack
    jackc compile Square/
    jackc tokens Main.jack
"#;

fn run_compile(path: impl AsRef<Path>) -> JackResult<()> {
    let path = path.as_ref();

    let sources = if path.is_dir() {
        jack_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    info!("compiling {} file(s)", sources.len());

    let start = Instant::now();
    for source_path in &sources {
        compile_file(source_path)?;
    }
    debug!(
        "time taken: {}ms",
        start.elapsed().as_nanos() as f64 / 1000000.0
    ); // to millis

    Ok(())
}

/// Source files in the directory, in a stable order.
fn jack_files(dir: &Path) -> JackResult<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "jack") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn compile_file(source_path: &Path) -> JackResult<()> {
    let source_code = read_source(source_path)?;
    let out_path = source_path.with_extension("vm");
    info!("{} -> {}", source_path.display(), out_path.display());

    let mut sink = IoSink::new(BufWriter::new(fs::File::create(&out_path)?));
    let result = Engine::new(source_code.as_str(), &mut sink).compile_class();

    // Keep whatever was emitted, even on failure.
    sink.flush()?;

    if result.is_err() {
        error!("failed to compile {}", source_path.display());
    }
    result
}

fn run_tokens(filepath: impl AsRef<Path>) -> JackResult<()> {
    let source_code = read_source(filepath.as_ref())?;

    let mut sink = IoSink::new(io::stdout().lock());
    jack::compile::write_tokens(source_code.as_str(), &mut sink)?;
    sink.flush()?;

    Ok(())
}

fn run_tree(filepath: impl AsRef<Path>) -> JackResult<()> {
    let source_code = read_source(filepath.as_ref())?;

    let mut vm_out = NullSink;
    let mut sink = IoSink::new(io::stdout().lock());
    let result = Engine::new(source_code.as_str(), &mut vm_out)
        .with_xml(&mut sink)
        .compile_class();
    sink.flush()?;

    result
}

fn read_source(path: &Path) -> JackResult<String> {
    let file_bytes = fs::read(path)?;
    Ok(String::from_utf8(file_bytes)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let result = match parse_args() {
        Some(Cmd::Compile { path }) => run_compile(path),
        Some(Cmd::Tokens { filepath }) => run_tokens(filepath),
        Some(Cmd::Tree { filepath }) => run_tree(filepath),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    if let Err(err) = result {
        // Diagnostics already carry the offending line.
        eprintln!("{err}");
        std::process::exit(1)
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;

    match cmd.as_str() {
        "compile" => Some(Cmd::Compile { path: args.next()? }),
        "tokens" => Some(Cmd::Tokens {
            filepath: args.next()?,
        }),
        "tree" => Some(Cmd::Tree {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("jackc v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

enum Cmd {
    /// Compile a file or directory
    Compile { path: String },
    /// Dump tokens
    Tokens { filepath: String },
    /// Dump parse tree
    Tree { filepath: String },
}
