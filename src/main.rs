use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use vmsg2xml::{
    batch::expand_inputs, convert_batch, parse_file, BatchConfig, BatchSource, Document,
    FormatConfig, Formatter, OnError, ParserConfig, VmsgFormatter, XmlFormatter,
};

#[derive(Debug, Parser)]
#[command(
    name = "vmsg2xml",
    version,
    about = "Convert Nokia VMG message exports to XML"
)]
struct Args {
    /// Message files or directories of *.vmg files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Worker threads used for batches
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Leave out messages that fail to parse instead of stopping
    #[arg(long)]
    skip_errors: bool,

    /// Fail when a message ends with unclosed tags
    #[arg(long)]
    require_balanced: bool,

    /// Maximum element nesting, 0 for unlimited
    #[arg(long, default_value_t = vmsg2xml::parser::config::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Spaces per indentation level in XML output
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
    format: OutputFormat,

    /// Wrap the output in the batch container even for a single file
    #[arg(long)]
    batch: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Xml,
    #[value(alias = "vmsg")]
    Vmg,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let parser_config = ParserConfig {
        require_balanced_at_eof: args.require_balanced,
        max_depth: args.max_depth,
        ..ParserConfig::default()
    };

    let files = expand_inputs(&args.inputs).context("failed to collect input files")?;
    if files.is_empty() {
        bail!("no message files found in the given inputs");
    }

    let document = match files.as_slice() {
        [single] if !args.batch => {
            info!("Reading file: {}", single.display());
            parse_file(single, &parser_config).context("conversion failed")?
        }
        _ => convert_all(&files, parser_config, &args)?,
    };

    let format_config = FormatConfig {
        indent_spaces: args.indent,
        ..FormatConfig::default()
    };
    let rendered = match args.format {
        OutputFormat::Xml => XmlFormatter.format(&document, &format_config),
        OutputFormat::Vmg => VmsgFormatter.format(&document, &format_config),
    };

    write_output(&args.output, rendered.as_bytes())
}

fn convert_all(files: &[PathBuf], parser: ParserConfig, args: &Args) -> Result<Document> {
    let config = BatchConfig {
        parser,
        on_error: if args.skip_errors {
            OnError::Skip
        } else {
            OnError::Abort
        },
        jobs: args.jobs,
        ..BatchConfig::default()
    };
    let sources: Vec<BatchSource> = files.iter().cloned().map(BatchSource::from).collect();

    let report = convert_batch(&sources, &config).context("batch conversion failed")?;
    if !report.failures.is_empty() {
        warn!(
            "{} of {} messages skipped",
            report.failures.len(),
            sources.len()
        );
    }
    info!("Converted {} messages", report.converted);
    Ok(report.document)
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
