//! # csv2avro
//!
//! Command-line front end for schema-driven CSV to Avro conversion.
//!
//! ## Usage
//!
//! ```bash
//! # Convert a CSV with a header row
//! csv2avro convert --schema employee.avsc employee.csv employee.avro
//!
//! # Pipe-delimited input without a header, skipping a banner line
//! csv2avro convert -s gpci.avsc -d '|' --no-header --skip-rows 1 GPCI2019.txt
//!
//! # Print an Avro file as JSON lines
//! csv2avro cat employee.avro
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv2avro::config::{single_byte, Config};
use csv2avro::{
    default_codec, parse_codec, AvroConverter, AvroRecordReader, Codec, CsvOptions, HeaderSource,
    Schema, WriteMode,
};

/// csv2avro - Schema-driven delimited text to Avro converter
#[derive(Parser)]
#[command(name = "csv2avro")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a delimited text file into an Avro container file
    Convert {
        /// Avro record schema (.avsc)
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Input delimited text file (may be gzip/zstd/bzip2/xz compressed)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output Avro file (defaults to INPUT with an .avro extension)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// TOML config file with a [conversion] table
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Field delimiter (single character, `\t` for tab)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Quote character
        #[arg(long)]
        quote: Option<String>,

        /// Leading rows to discard before the header or data
        #[arg(long)]
        skip_rows: Option<usize>,

        /// Map columns by position; the file has no header row
        #[arg(long, conflicts_with = "columns")]
        no_header: bool,

        /// Explicit column names, comma separated; the file has no header row
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Avro block codec (null, deflate)
        #[arg(short, long)]
        codec: Option<String>,

        /// Append to an existing Avro file instead of replacing it
        #[arg(long)]
        append: bool,

        /// Fail on header columns that are not in the schema
        #[arg(long)]
        strict_columns: bool,
    },

    /// Print the records of an Avro file as JSON lines
    Cat {
        /// Input Avro file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Stop after this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Convert {
            schema,
            input,
            output,
            config,
            delimiter,
            quote,
            skip_rows,
            no_header,
            columns,
            codec,
            append,
            strict_columns,
        } => {
            let config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            let conv = config.conversion;

            let mut options = conv.csv_options()?;
            if let Some(d) = delimiter {
                options.delimiter = single_byte("delimiter", &d)?;
            }
            if let Some(q) = quote {
                options.quote = single_byte("quote", &q)?;
            }
            if let Some(n) = skip_rows {
                options.skip_rows = n;
            }
            let columns = columns.or(conv.header_names);
            if no_header || columns.is_some() {
                options.header = HeaderSource::None;
            }

            let codec = match codec.or(conv.codec) {
                Some(name) => parse_codec(&name)?,
                None => default_codec(),
            };
            let mode = if append {
                WriteMode::Append
            } else {
                conv.mode.unwrap_or_default()
            };
            let strict = strict_columns || conv.strict_columns.unwrap_or(false);
            let output = output.unwrap_or_else(|| input.with_extension("avro"));

            run_convert(&schema, &input, &output, &options, columns, codec, mode, strict)
        }
        Commands::Cat { file, limit } => run_cat(&file, limit),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_convert(
    schema_path: &Path,
    input: &Path,
    output: &Path,
    options: &CsvOptions,
    columns: Option<Vec<String>>,
    codec: Codec,
    mode: WriteMode,
    strict: bool,
) -> Result<()> {
    let schema = Schema::from_path(schema_path)
        .with_context(|| format!("load schema {}", schema_path.display()))?;
    info!("schema {} with {} fields", schema.name(), schema.len());

    let mut session = AvroConverter::create(&schema, output, mode, codec)
        .with_context(|| format!("open output {}", output.display()))?
        .strict_columns(strict);
    if let Some(names) = columns {
        session.set_header(names).context("set header columns")?;
    }

    let stats = session
        .convert_file(input, options)
        .with_context(|| format!("convert {}", input.display()))?;

    println!(
        "There were {} lines processed from: {}",
        stats.rows_written,
        input.display()
    );
    println!("The results were written to: {}", output.display());
    Ok(())
}

fn run_cat(path: &Path, limit: Option<usize>) -> Result<()> {
    let reader = AvroRecordReader::open(path)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in reader.take(limit.unwrap_or(usize::MAX)) {
        let record = record.with_context(|| format!("read {}", path.display()))?;
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
