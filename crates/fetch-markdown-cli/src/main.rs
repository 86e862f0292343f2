//! fetch-markdown CLI - fetch a web page and output cleaned Markdown

use clap::Parser;
use fetch_markdown::{fetch_markdown_with_options, html_to_markdown, FetchOptions};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Fetch a web page and output cleaned Markdown
#[derive(Parser, Debug)]
#[command(name = "fetch-markdown")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL to fetch
    url: Option<String>,

    /// Convert a local HTML file instead of fetching a URL
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Optional path to write the generated Markdown to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Return raw content when simplification is not desired
    #[arg(long)]
    raw: bool,

    /// Custom User-Agent header, defaults to a fetch-markdown specific agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Skip robots.txt validation (use with caution)
    #[arg(long)]
    ignore_robots: bool,

    /// Optional HTTP/HTTPS proxy URL
    #[arg(long)]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30.0)]
    timeout: f64,

    /// Base URL for relative-link rewriting, inferred from the source
    /// URL or file path when omitted
    #[arg(long)]
    base_url: Option<String>,

    /// Keep relative links as-is instead of resolving them
    #[arg(long)]
    no_rewrite_relative_urls: bool,

    /// Emit a JSON report instead of plain Markdown
    #[arg(long)]
    json: bool,
}

/// JSON report emitted with `--json`
#[derive(Debug, Serialize)]
struct Report {
    /// URL or file path the Markdown came from
    source: String,
    /// Generated Markdown (or raw) text
    markdown: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.timeout <= 0.0 {
        exit_error("timeout must be greater than zero");
    }

    let options = FetchOptions {
        user_agent: cli.user_agent.clone(),
        timeout: Duration::from_secs_f64(cli.timeout),
        proxy_url: cli.proxy.clone(),
        ignore_robots_txt: cli.ignore_robots,
        force_raw: cli.raw,
        base_url: cli.base_url.clone(),
        rewrite_relative_urls: !cli.no_rewrite_relative_urls,
    };

    let (source, result) = match (&cli.url, &cli.file) {
        (Some(url), None) => (
            url.clone(),
            fetch_markdown_with_options(url, options).await,
        ),
        (None, Some(path)) => (path.display().to_string(), convert_file(path, options)),
        _ => {
            eprintln!("Usage: fetch-markdown <URL>");
            eprintln!("   or: fetch-markdown --file <PAGE.html>");
            eprintln!("   or: fetch-markdown --help");
            std::process::exit(1);
        }
    };

    let markdown = match result {
        Ok(markdown) => markdown,
        Err(e) => exit_error(&e.to_string()),
    };

    let text = if cli.json {
        match serde_json::to_string_pretty(&Report { source, markdown }) {
            Ok(json) => json,
            Err(e) => exit_error(&format!("failed to serialize report: {}", e)),
        }
    } else {
        markdown
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = write_output(&path, &text) {
                exit_error(&format!("failed to write {}: {}", path.display(), e));
            }
            eprintln!("Markdown written to {}", path.display());
        }
        None => writeln_safe(&text),
    }
}

/// Read a local HTML file and convert it, inferring the base URL from
/// the file path unless one was given
fn convert_file(path: &Path, mut options: FetchOptions) -> Result<String, fetch_markdown::Error> {
    let html = std::fs::read_to_string(path).map_err(|e| fetch_markdown::Error::Fetch {
        url: path.display().to_string(),
        reason: e.to_string(),
        source: None,
    })?;
    if options.base_url.is_none() {
        options.base_url = file_base_url(path);
    }
    html_to_markdown(&html, None, &options)
}

/// `file://` base URL for a local HTML file
fn file_base_url(path: &Path) -> Option<String> {
    let absolute = std::fs::canonicalize(path).ok()?;
    Url::from_file_path(absolute).ok().map(Into::into)
}

/// Write the output file, creating parent directories as needed
fn write_output(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)
}

fn exit_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
