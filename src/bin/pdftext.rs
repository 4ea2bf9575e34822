//! CLI binary for edgequake-pdftext.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdftext::{
    extract_async, extract_to_file, inspect, ExtractionConfig, ExtractionMethod,
    ExtractionProgressCallback, ExtractionStage, PageBreak, PageSelection, ProgressCallback,
    TextMode,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the document opens, then a
/// page bar with one log line per extracted page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_extraction_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: ExtractionStage) {
        if stage == ExtractionStage::Loading {
            self.bar.set_message("Loading PDF engine…");
        }
    }

    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, char_count: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{char_count:>6} chars")),
            dim(&format!("{}ms", elapsed_ms)),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, char_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages extracted  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&format!("{char_count} chars")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Layout-aware Markdown (stdout)
  pdftext document.pdf

  # Plain text per page, written to a file
  pdftext --method pypdf document.pdf -o document.txt

  # pdfium's own text order instead of the column layout
  pdftext --method pypdf --text-mode plain document.pdf

  # Specific pages, no page-break markers
  pdftext --pages 3-9 --no-page-breaks paper.pdf

  # Custom page-break marker
  pdftext --marker '<!-- page -->' paper.pdf -o paper.md

  # Inspect PDF metadata
  pdftext --inspect-only document.pdf

  # JSON output with per-page text and stats
  pdftext --json --metadata document.pdf > output.json

METHODS:
  docling   Layout-aware Markdown: reading order, headings, lists, emphasis.
            Pages joined with "\n\n---PAGE_BREAK---\n\n".
  pypdf     Per-page text. Pages joined with "\n---PAGE_BREAK---\n".

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to a libpdfium shared library
  PDFTEXT_*         Every flag can be set as PDFTEXT_<FLAG> (e.g. PDFTEXT_METHOD=pypdf)
  RUST_LOG          Overrides the log filter

SETUP:
  pdftext needs the pdfium shared library. It looks at PDFIUM_LIB_PATH, then
  the working directory, then the system library path.
  Prebuilt binaries: https://github.com/bblanchon/pdfium-binaries
"#;

/// Extract text from PDF files as Markdown or plain text.
#[derive(Parser, Debug)]
#[command(
    name = "pdftext",
    version,
    about = "Extract text from PDF files as Markdown or plain text",
    long_about = "Extract the text of PDF documents with one of two strategies: layout-aware \
Markdown (\"docling\") or per-page plain text (\"pypdf\"). Pages are separated by a \
---PAGE_BREAK--- marker unless disabled.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Extraction method.
    #[arg(short, long, env = "PDFTEXT_METHOD", value_enum, default_value = "docling")]
    method: MethodArg,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "PDFTEXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFTEXT_PAGES", default_value = "all")]
    pages: String,

    /// Join pages without any marker.
    #[arg(long, env = "PDFTEXT_NO_PAGE_BREAKS", conflicts_with = "marker")]
    no_page_breaks: bool,

    /// Custom page-break marker instead of ---PAGE_BREAK---.
    #[arg(long, env = "PDFTEXT_MARKER")]
    marker: Option<String>,

    /// Text-strategy extraction mode.
    #[arg(long, env = "PDFTEXT_TEXT_MODE", value_enum, default_value = "layout")]
    text_mode: TextModeArg,

    /// Keep rotated text (watermarks, margin stamps) in layout text mode.
    #[arg(long, env = "PDFTEXT_KEEP_ROTATED")]
    keep_rotated: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFTEXT_PASSWORD")]
    password: Option<String>,

    /// Prepend YAML front-matter with document metadata (docling only).
    #[arg(long, env = "PDFTEXT_METADATA")]
    metadata: bool,

    /// Output structured JSON (ExtractionOutput) instead of text.
    #[arg(long, env = "PDFTEXT_JSON")]
    json: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFTEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFTEXT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    Docling,
    Pypdf,
}

impl From<MethodArg> for ExtractionMethod {
    fn from(v: MethodArg) -> Self {
        match v {
            MethodArg::Docling => ExtractionMethod::Layout,
            MethodArg::Pypdf => ExtractionMethod::Text,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TextModeArg {
    Layout,
    Plain,
}

impl From<TextModeArg> for TextMode {
    fn from(v: TextModeArg) -> Self {
        match v {
            TextModeArg::Layout => TextMode::Layout,
            TextModeArg::Plain => TextMode::Plain,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let input = cli.input.clone();
        let meta = tokio::task::spawn_blocking(move || inspect(&input))
            .await
            .context("Inspect task panicked")?
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let input = cli.input.clone();
        let out = output_path.clone();
        let stats = tokio::task::spawn_blocking(move || extract_to_file(&input, &out, &config))
            .await
            .context("Extraction task panicked")?
            .context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {} chars  {}ms  →  {}",
                green("✔"),
                stats.extracted_pages,
                stats.total_pages,
                stats.total_chars,
                stats.duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let output = extract_async(&cli.input, config)
            .await
            .context("Extraction failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.text.as_bytes())
                .context("Failed to write to stdout")?;
            // Ensure a trailing newline on stdout.
            if !output.text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }

        if !cli.quiet && !show_progress && !cli.json {
            eprintln!(
                "Extracted {}/{} pages ({} chars) in {}ms",
                output.stats.extracted_pages,
                output.stats.total_pages,
                output.stats.total_chars,
                output.stats.duration_ms
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages = parse_pages(&cli.pages)?;
    let page_break = match (&cli.marker, cli.no_page_breaks) {
        (_, true) => PageBreak::None,
        (Some(marker), false) => PageBreak::Custom(marker.clone()),
        (None, false) => PageBreak::Marker,
    };

    let mut builder = ExtractionConfig::builder()
        .method(cli.method.into())
        .text_mode(cli.text_mode.into())
        .strip_rotated(!cli.keep_rotated)
        .page_break(page_break)
        .pages(pages)
        .include_metadata(cli.metadata);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
