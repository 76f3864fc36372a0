//! CLI binary for med2tex.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use med2tex::pipeline::compile::compile_pdf;
use med2tex::{
    convert_dir, convert_file, convert_text, workflow, ConversionConfig,
    ConversionProgressCallback, ProgressCallback, SourceShape, SplitStrategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-document
/// log lines using [indicatif]. Designed to work correctly when documents
/// complete out-of-order (concurrent batch mode).
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} transcripts…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, latex_len: usize) {
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{latex_len:>6} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render one transcript to stdout
  med2tex notes.txt

  # Render to a file and compile to PDF
  med2tex notes.txt -o notes.tex --compile

  # Batch-convert a directory of transcripts
  med2tex transcripts/ -o tex/

  # Force the synthesized-report renderer with keyword splitting
  med2tex --mode report notes.txt
  med2tex --split keywords notes.txt

  # Full pipeline: OCR the PDFs, synthesize one report, render, compile
  med2tex --workflow scans/ -o build/

  # JSON stats instead of LaTeX
  med2tex --json transcripts/ -o tex/ > batch.json

MODES:
  auto      Sniff each input: '**SECTION' tags select the report renderer (default)
  freeform  OCR transcript: SECTION n: headers, key/value tables, checkboxes
  report    Synthesized report: **SECTION n:** headers, bullets, bold pairs

SPLIT STRATEGIES (freeform mode):
  headers        Split on explicit 'SECTION n: TITLE' lines (default)
  keywords       Split on medical section-name phrases
  auto           Headers first, keywords when no header matched

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       Synthesis model API key (workflow mode)
  MED2TEX_OCR_URL      OCR service base URL (default http://localhost:8000)
  MED2TEX_PDFLATEX     Path to the pdflatex binary

WORKFLOW MODE:
  --workflow runs OCR → synthesis → render → compile over a directory of
  .pdf scans and .txt transcripts, leaving intermediate artifacts in the
  output directory so a failed run can be inspected and resumed.
"#;

/// Render OCR and LLM-synthesized medical transcripts as structured LaTeX.
#[derive(Parser, Debug)]
#[command(
    name = "med2tex",
    version,
    about = "Render medical transcripts as structured LaTeX reports",
    long_about = "Classify each line of an OCR or LLM-synthesized medical transcript \
(key/value field, checkbox answer, header, bullet, prose) and render the document as \
typeset LaTeX: tables for fields, canonical checkbox markers, itemized question lists.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Transcript file (.txt) or directory of transcripts.
    input: PathBuf,

    /// Output .tex file (file input) or directory (directory input).
    /// File input without -o prints LaTeX to stdout.
    #[arg(short, long, env = "MED2TEX_OUTPUT")]
    output: Option<PathBuf>,

    /// Input shape: auto, freeform, report.
    #[arg(long, env = "MED2TEX_MODE", value_enum, default_value = "auto")]
    mode: ModeArg,

    /// Freeform section splitting: headers, keywords, auto.
    #[arg(long, env = "MED2TEX_SPLIT", value_enum, default_value = "headers")]
    split: SplitArg,

    /// Document title for the LaTeX preamble.
    #[arg(long, env = "MED2TEX_TITLE", default_value = "Medical Report")]
    title: String,

    /// Document author for the LaTeX preamble.
    #[arg(long, env = "MED2TEX_AUTHOR", default_value = "Automated Transcription")]
    author: String,

    /// Value length above which report key/value lines wrap to a parbox.
    #[arg(long, env = "MED2TEX_WRAP", default_value_t = 60)]
    wrap_threshold: usize,

    /// Documents converted concurrently in batch mode.
    #[arg(short, long, env = "MED2TEX_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Run the full OCR → synthesis → render → compile workflow.
    #[arg(long)]
    workflow: bool,

    /// Compile the rendered .tex to PDF with pdflatex.
    #[arg(long)]
    compile: bool,

    /// OCR service base URL (workflow mode).
    #[arg(long, env = "MED2TEX_OCR_URL", default_value = "http://localhost:8000")]
    ocr_url: String,

    /// Synthesis model identifier (workflow mode).
    #[arg(long, env = "MED2TEX_SYNTHESIS_MODEL", default_value = "gemini-2.0-flash")]
    synthesis_model: String,

    /// Path to the pdflatex binary.
    #[arg(long, env = "MED2TEX_PDFLATEX", default_value = "pdflatex")]
    pdflatex: String,

    /// Output structured JSON (stats / batch report) instead of LaTeX.
    #[arg(long, env = "MED2TEX_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "MED2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MED2TEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MED2TEX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    Auto,
    Freeform,
    Report,
}

impl From<ModeArg> for SourceShape {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Auto => SourceShape::Auto,
            ModeArg::Freeform => SourceShape::FreeformSections,
            ModeArg::Report => SourceShape::TaggedReport,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SplitArg {
    Headers,
    Keywords,
    Auto,
}

impl From<SplitArg> for SplitStrategy {
    fn from(v: SplitArg) -> Self {
        match v {
            SplitArg::Headers => SplitStrategy::Headers,
            SplitArg::Keywords => SplitStrategy::Keywords,
            SplitArg::Auto => SplitStrategy::HeadersThenKeywords,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let is_batch = cli.input.is_dir() && !cli.workflow;
    let show_progress = is_batch && !cli.quiet && !cli.no_progress && !cli.json;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if cli.workflow {
        return run_workflow(&cli, &config).await;
    }
    if cli.input.is_dir() {
        return run_batch(&cli, &config).await;
    }
    run_single(&cli, &config).await
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .shape(cli.mode.clone().into())
        .split_strategy(cli.split.clone().into())
        .title(cli.title.as_str())
        .author(cli.author.as_str())
        .wrap_threshold(cli.wrap_threshold)
        .concurrency(cli.concurrency)
        .ocr_url(cli.ocr_url.as_str())
        .synthesis_model(cli.synthesis_model.as_str())
        .pdflatex_path(cli.pdflatex.as_str());

    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Convert one transcript file; print to stdout or write to `-o`.
async fn run_single(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    if let Some(ref output_path) = cli.output {
        let stats = convert_file(&cli.input, output_path, config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
            );
        } else if !cli.quiet {
            eprintln!(
                "{}  {} sections, {} rows, {} items  →  {}",
                green("✔"),
                stats.sections,
                stats.table_rows,
                stats.checkbox_items + stats.list_items,
                bold(&output_path.display().to_string()),
            );
        }

        if cli.compile {
            let pdf = compile_pdf(output_path, config)
                .await
                .context("LaTeX compilation failed")?;
            if !cli.quiet {
                eprintln!("{}  compiled  →  {}", green("✔"), bold(&pdf.display().to_string()));
            }
        }
        return Ok(());
    }

    if cli.compile {
        anyhow::bail!("--compile requires -o <FILE> so pdflatex has a .tex file to compile");
    }

    let text = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("Failed to read transcript {:?}", cli.input))?;
    let output = convert_text(&text, config);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.latex.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.latex.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

/// Batch-convert a directory of transcripts.
async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.join("tex"));

    let batch = convert_dir(&cli.input, &output_dir, config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&batch).context("Failed to serialise batch output")?
        );
    } else if !cli.quiet && cli.no_progress {
        // The progress callback already printed the summary otherwise.
        eprintln!(
            "Converted {}/{} documents in {}ms",
            batch.stats.succeeded, batch.stats.total, batch.stats.duration_ms
        );
    }

    if batch.stats.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Run the four-stage workflow over a directory of scans and transcripts.
async fn run_workflow(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let work_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.join("build"));

    let report = workflow::run(&cli.input, &work_dir, config)
        .await
        .context("Workflow failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        for stage in &report.stages {
            eprintln!(
                "{}  {:?}  {}ms",
                green("✔"),
                stage.stage,
                stage.duration_ms
            );
        }
        if let Some(ref pdf) = report.report_pdf {
            eprintln!("{}  report  →  {}", green("✔"), bold(&pdf.display().to_string()));
        }
    }
    Ok(())
}
