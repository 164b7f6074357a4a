//! CLI tool to convert fixed-width files to JSON Lines and back.
//!
//! Usage:
//!   fw-convert --schema <layout.json> decode <input.dat> [-o output.jsonl]
//!   fw-convert --schema <layout.json> encode <input.jsonl> [-o output.dat]
//!
//! If no output file is specified, writes to stdout.

use clap::{Parser, Subcommand};
use fixedwidth_rs::{Schema, Truncation, decode_document, encode_document};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use tracing::Level;

/// Convert fixed-width records using a JSON layout schema.
#[derive(Parser)]
#[command(name = "fw-convert")]
struct Cli {
    /// Layout schema file (JSON with a "fields" list of name/tag pairs)
    #[arg(short, long)]
    schema: String,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Log layout and record counts on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fixed-width lines to JSON Lines (one object per record)
    Decode {
        /// Input data file (or /dev/stdin)
        input: String,
    },
    /// JSON Lines to fixed-width lines
    Encode {
        /// Input JSON Lines file (or /dev/stdin)
        input: String,

        /// Fail instead of truncating values wider than their field
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let schema_text = match fs::read_to_string(&cli.schema) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading schema file '{}': {e}", cli.schema);
            process::exit(1);
        }
    };

    let layout = match Schema::from_json(&schema_text).and_then(|schema| schema.layout()) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Schema error: {e}");
            process::exit(1);
        }
    };

    let input = match &cli.command {
        Command::Decode { input } | Command::Encode { input, .. } => input,
    };
    let input_text = match fs::read_to_string(input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading input file '{input}': {e}");
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Decode { .. } => decode_document(&layout, &input_text),
        Command::Encode { strict, .. } => {
            let truncation = if *strict {
                Truncation::Reject
            } else {
                Truncation::Silent
            };
            encode_document(&layout, &input_text, truncation)
        }
    };

    match result {
        Ok((output, count)) => {
            if let Some(out_path) = &cli.output {
                if let Some(parent) = Path::new(out_path.as_str()).parent()
                    && !parent.as_os_str().is_empty()
                    && fs::create_dir_all(parent).is_err()
                {
                    eprintln!("Error creating output directory for '{out_path}'");
                    process::exit(1);
                }
                let mut output = output;
                if !output.is_empty() {
                    output.push('\n');
                }
                if let Err(e) = fs::write(out_path, &output) {
                    eprintln!("Error writing output file '{out_path}': {e}");
                    process::exit(1);
                }
            } else {
                if let Err(e) = io::stdout().write_all(output.as_bytes()) {
                    eprintln!("Error writing output: {e}");
                    process::exit(1);
                }
                if !output.is_empty() {
                    println!();
                }
            }
            if cli.verbose {
                eprintln!("Records:  {count}");
            }
        }
        Err(e) => {
            eprintln!("Conversion error: {e}");
            process::exit(1);
        }
    }
}
