//! Telemetry Decoder CLI Application
//!
//! Command-line front end for the telemetry-decoder library. Reads
//! `<data_id> <timestamp> <message>` lines from files or stdin, decodes them
//! with the loaded device definitions and writes the decoded records.

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use telemetry_decoder::{ParseOutcome, RecordParser, RecordWriter};

mod config;
mod report;
mod writer;

use config::AppConfig;
use report::ParseSummary;
use writer::JsonLinesWriter;

/// Telemetry Decoder - Decode instrument telemetry records
#[derive(Parser, Debug)]
#[command(name = "telemetry-cli")]
#[command(about = "Decode telemetry records using device definitions", long_about = None)]
#[command(version)]
struct Args {
    /// Comma-separated glob patterns of definition files
    #[arg(short, long, value_name = "GLOBS")]
    definitions: Option<String>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Record file(s) to decode (default: stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Vec<PathBuf>,

    /// Output file for decoded records (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write records as JSON
    #[arg(long)]
    json: bool,

    /// Write records as table rows (JSON lines)
    #[arg(long)]
    das_record: bool,

    /// Template splitting each line into data_id, timestamp and message
    #[arg(long, value_name = "TEMPLATE")]
    record_format: Option<String>,

    /// Number of lines decoded in parallel
    #[arg(long, value_name = "COUNT")]
    batch_size: Option<usize>,

    /// Fail on duplicate definition names instead of keeping the last one
    #[arg(long)]
    strict_definitions: bool,

    /// Match template literals case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Telemetry Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", telemetry_decoder::VERSION);

    let config = resolve_config(&args)?;

    let parser = RecordParser::from_definition_path(
        config.parser.clone(),
        &config.input.definition_path,
    )
    .with_context(|| {
        format!(
            "Failed to load definitions from {:?}",
            config.input.definition_path
        )
    })?;

    let stats = parser.catalog_stats();
    log::info!(
        "Loaded {} devices, {} device types ({} templates)",
        stats.num_devices,
        stats.num_device_types,
        stats.num_templates
    );

    let out: Box<dyn Write> = match &config.output.file {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = JsonLinesWriter::new(BufWriter::new(out));
    let mut summary = ParseSummary::new();

    if config.input.files.is_empty() {
        log::info!("Reading records from stdin");
        decode_stream(
            &parser,
            io::stdin().lock(),
            config.input.batch_size,
            &mut writer,
            &mut summary,
        )?;
    } else {
        for path in &config.input.files {
            log::info!("Reading records from {:?}", path);
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {:?}", path))?;
            decode_stream(
                &parser,
                BufReader::new(file),
                config.input.batch_size,
                &mut writer,
                &mut summary,
            )
            .with_context(|| format!("Failed to decode {:?}", path))?;
        }
    }

    writer.flush().context("Failed to flush output")?;
    summary.log();

    Ok(())
}

/// Merge the config file (if any) with command line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(definitions) = &args.definitions {
        config.input.definition_path = definitions.clone();
    }
    if !args.input.is_empty() {
        config.input.files = args.input.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.input.batch_size = batch_size.max(1);
    }
    if args.output.is_some() {
        config.output.file = args.output.clone();
    }
    if let Some(record_format) = &args.record_format {
        config.parser.record_format = record_format.clone();
    }

    let parser = &mut config.parser;
    parser.return_json |= args.json;
    parser.return_das_record |= args.das_record;
    parser.strict_definitions |= args.strict_definitions;
    parser.case_sensitive |= args.case_sensitive;
    parser.quiet |= args.quiet;

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Decode every line of `reader` in batches, writing parsed records in input order
fn decode_stream<R, W>(
    parser: &RecordParser,
    mut reader: R,
    batch_size: usize,
    writer: &mut JsonLinesWriter<W>,
    summary: &mut ParseSummary,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut batch: Vec<String> = Vec::with_capacity(batch_size);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).context("Failed to read input")?;
        if read > 0 {
            // Invalid UTF-8 is decoded lossily so the line is still counted
            let line = String::from_utf8_lossy(&buf);
            batch.push(line.trim_end_matches(['\r', '\n']).to_string());
        }

        if batch.len() >= batch_size || (read == 0 && !batch.is_empty()) {
            let outcomes: Vec<ParseOutcome> = batch
                .par_iter()
                .map(|line| parser.parse_record(line))
                .collect();

            for outcome in &outcomes {
                summary.record(outcome);
                if let ParseOutcome::Parsed(record) = outcome {
                    writer.emit(record)?;
                }
            }
            batch.clear();
        }

        if read == 0 {
            return Ok(());
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
