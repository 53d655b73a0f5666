//! 逐行读取标准输入并统计行数与字符数。
//!
//! ```text
//! printf 'header\na\nb\n' | cargo run -p spark-line-reader-tokio --example read_stdin -- --skip 1 --echo
//! RUST_LOG=spark_line_reader=trace cargo run -p spark-line-reader-tokio --example read_stdin < input.txt
//! ```

use clap::Parser;
use spark_line_reader::{LineAssembler, TextEncoding};
use spark_line_reader_tokio::AsyncReadSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Read stdin line by line with backpressure")]
struct Args {
    /// Encoding of the input bytes: ascii, utf8, utf16le, ucs2 or latin1.
    #[arg(long, default_value = "utf8")]
    encoding: TextEncoding,
    /// Number of leading lines to discard.
    #[arg(long, default_value_t = 0)]
    skip: usize,
    /// Print every line to stdout.
    #[arg(long)]
    echo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let reader = LineAssembler::with_options(AsyncReadSource::stdin()?, args.encoding);

    let skipped = reader.skip(args.skip).await?;
    let mut lines = 0_usize;
    let mut chars = 0_usize;
    while let Some(line) = reader.read_line().await? {
        lines += 1;
        chars += line.chars().count();
        if args.echo {
            println!("{line}");
        }
    }

    info!(skipped, lines, chars, encoding = %reader.encoding(), "stdin exhausted");
    println!("{lines} lines, {chars} characters ({skipped} skipped)");
    Ok(())
}
