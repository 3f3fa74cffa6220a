use std::io::{BufWriter, Read, Write as _};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wasm_disasm::binary::{ByteReader, ReadSource};
use wasm_disasm::{Options, disassemble};

#[derive(Parser)]
#[command(name = "wasm-disasm")]
#[command(about = "Disassemble a WebAssembly binary module into annotated text")]
struct Cli {
    /// Module to read; standard input when absent or `-`
    input: Option<PathBuf>,

    /// Dump every section as hex instead of decoding it
    #[arg(long)]
    raw: bool,

    /// Column where inline instruction docs start
    #[arg(long, default_value_t = 80)]
    comment_column: usize,

    /// Bytes requested from the input per read
    #[arg(long, default_value_t = 64 * 1024)]
    chunk_size: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = Options {
        raw: cli.raw,
        comment_column: cli.comment_column,
    };

    let input: Box<dyn Read> = match &cli.input {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(file)
        }
        _ => Box::new(std::io::stdin().lock()),
    };
    let mut bytes = ByteReader::new(ReadSource::new(input, cli.chunk_size));

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    disassemble(&mut bytes, &mut out, &options)?;
    out.flush()?;
    Ok(())
}
