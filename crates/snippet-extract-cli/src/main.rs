use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use snippet_extract::{Extraction, Extractor, SnippetSpan};
use snippet_extract_config::{Config, LoadOptions};
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Name of the snippet region to print
    #[arg(short = 'n', long, value_name = "NAME")]
    snippet: Option<String>,

    /// Extra comment prefix that may introduce a marker (repeatable)
    #[arg(
        short = 'p',
        long = "comment-prefix",
        value_name = "PREFIX",
        allow_hyphen_values = true
    )]
    comment_prefixes: Vec<String>,

    /// Configuration file taking precedence over discovered ones
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List snippet names and marker lines instead of extracting
    #[arg(short, long, conflicts_with = "snippet")]
    list: bool,

    /// Fail when the requested snippet has no start/end marker pair
    #[arg(long, requires = "snippet")]
    require_match: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Path to the listing
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let extractor = build_extractor(&cli)?;
    let source = read_source(&cli.path).with_context(|| {
        format!(
            "Unable to read listing at path or stream: {}",
            cli.path.display()
        )
    })?;

    if cli.list {
        let spans = extractor.list_snippets(&source);
        return print_text(&render_spans(&spans, cli.format)?);
    }

    let extraction = extractor.extract(&source, cli.snippet.as_deref());
    if cli.require_match && !extraction.isolated {
        if let Some(name) = &cli.snippet {
            bail!("No snippet named '{}' in {}", name, cli.path.display());
        }
    }

    print_text(&render_extraction(
        &extraction,
        cli.snippet.as_deref(),
        cli.format,
    )?)
}

fn init_tracing(verbose: bool) {
    // --verbose forces DEBUG, otherwise RUST_LOG or WARN
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_extractor(cli: &Cli) -> Result<Extractor> {
    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }

    let config = Config::load(options).context("Failed to load configuration")?;
    let prefixes = config
        .markers
        .comment_prefixes
        .extend(cli.comment_prefixes.iter().cloned())
        .context("Invalid --comment-prefix")?;

    tracing::debug!(prefixes = %prefixes, "recognising marker comment prefixes");
    Ok(Extractor::new(prefixes)?)
}

fn read_source(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().lock().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn render_extraction(
    extraction: &Extraction,
    snippet: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(extraction.text.clone()),
        OutputFormat::Json => {
            let payload = json!({
                "snippet": snippet,
                "isolated": extraction.isolated,
                "text": extraction.text,
            });
            Ok(serde_json::to_string_pretty(&payload)?)
        }
    }
}

fn render_spans(spans: &[SnippetSpan], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(spans
            .iter()
            .map(|span| match span.end_line {
                Some(end) => format!("{} (lines {}-{})", span.name, span.start_line, end),
                None => format!("{} (line {}, unclosed)", span.name, span.start_line),
            })
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => {
            let payload = spans
                .iter()
                .map(|span| {
                    json!({
                        "name": span.name,
                        "start_line": span.start_line,
                        "end_line": span.end_line,
                    })
                })
                .collect::<Vec<_>>();
            Ok(serde_json::to_string_pretty(&payload)?)
        }
    }
}

fn print_text(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match writeln!(handle, "{}", text) {
        Ok(_) => {}
        Err(err) if should_ignore_pipe_error(&err) => return Ok(()),
        Err(err) => return Err(err).context("Failed to print output"),
    }

    match handle.flush() {
        Ok(_) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("Failed to flush stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
