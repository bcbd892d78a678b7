//! CLI binary for pdf2md-upload.
//!
//! A thin shim over the library crate: CLI flags become an `UploaderConfig`,
//! file arguments go through the view's dropzone, and the rendered page is
//! printed once the submission resolves.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_upload::{
    save_result, service_from_config, ConversionResult, FileHandle, InFlightPolicy,
    RequestOutcome, SubmitError, Theme, ThemeMode, UploadController, UploadObserver,
    UploadView, UploaderConfig, DEFAULT_MAX_FILE_SIZE,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Alerts ───────────────────────────────────────────────────────────────────

/// Prints each alert as a red line on stderr, above the spinner if one is live.
struct CliNotifier {
    theme: Theme,
    spinner: Arc<SpinnerObserver>,
}

impl pdf2md_upload::Notifier for CliNotifier {
    fn notify(&self, message: &str) {
        let line = format!("{} {}", self.theme.error("✘"), self.theme.error(message));
        self.spinner.println(&line);
    }
}

// ── Spinner while a request is outstanding ───────────────────────────────────

struct SpinnerObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn println(&self, line: &str) {
        match self.bar.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            bar.finish_and_clear();
        }
    }
}

impl UploadObserver for SpinnerObserver {
    fn on_submit_start(&self, file: &FileHandle) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Uploading");
        bar.set_message(file.name().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
    }

    fn on_result_changed(&self, _result: Option<&ConversionResult>) {
        self.finish();
    }

    fn on_submit_error(&self, _error: &SubmitError) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF against a local server and show the result panes
  pdf2md-upload report.pdf

  # Remote endpoint, JSON output
  pdf2md-upload --base-url https://convert.example.com --json report.pdf

  # Save the result as Markdown, retrying transient failures twice
  pdf2md-upload --max-retries 2 -o report.md report.pdf

ENVIRONMENT VARIABLES:
  PDF2MD_UPLOAD_BASE_URL   Conversion service base URL
  PDF2MD_UPLOAD_PATH       Upload route (default /api/py/upload)
  NO_COLOR                 Disable coloured output
  RUST_LOG                 Override the log filter
"#;

/// Upload a document for PDF-to-Markdown conversion and show the result.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-upload",
    version,
    about = "Upload a document for PDF-to-Markdown conversion and show the result",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to select. The dropzone accepts one; extra files are refused.
    files: Vec<PathBuf>,

    /// Base URL of the conversion service.
    #[arg(long, env = "PDF2MD_UPLOAD_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Upload route joined onto the base URL.
    #[arg(long, env = "PDF2MD_UPLOAD_PATH", default_value = "/api/py/upload")]
    upload_path: String,

    /// Multipart field name carrying the file.
    #[arg(long, env = "PDF2MD_UPLOAD_FIELD", default_value = "file")]
    field_name: String,

    /// Maximum accepted file size in bytes.
    #[arg(long, env = "PDF2MD_UPLOAD_MAX_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_size: u64,

    /// Per-request timeout in seconds (no timeout when omitted).
    #[arg(long, env = "PDF2MD_UPLOAD_TIMEOUT")]
    timeout: Option<u64>,

    /// Retries on network errors and 5xx responses.
    #[arg(long, env = "PDF2MD_UPLOAD_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Initial retry delay in milliseconds (doubles each retry).
    #[arg(long, env = "PDF2MD_UPLOAD_RETRY_BACKOFF_MS", default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Refuse a second submission while one is outstanding.
    #[arg(long, env = "PDF2MD_UPLOAD_SINGLE_FLIGHT")]
    single_flight: bool,

    /// Colour theme.
    #[arg(long, env = "PDF2MD_UPLOAD_THEME", value_enum, default_value = "system")]
    theme: ThemeArg,

    /// Visible lines per result pane.
    #[arg(long, env = "PDF2MD_UPLOAD_PANE_HEIGHT", default_value_t = 16)]
    pane_height: usize,

    /// Print the result as JSON instead of rendering the page.
    #[arg(long)]
    json: bool,

    /// Also write the result to this Markdown file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable the upload spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for ThemeMode {
    fn from(v: ThemeArg) -> Self {
        match v {
            ThemeArg::Light => ThemeMode::Light,
            ThemeArg::Dark => ThemeMode::Dark,
            ThemeArg::System => ThemeMode::System,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Build config and wiring ──────────────────────────────────────────
    let config = build_config(&cli)?;
    let theme = Theme::detect(cli.theme.into());

    let spinner = SpinnerObserver::new();
    let controller = Arc::new(
        UploadController::new(
            service_from_config(&config).context("Failed to set up the upload client")?,
            Arc::new(CliNotifier {
                theme,
                spinner: Arc::clone(&spinner),
            }),
        )
        .with_policy(config.in_flight),
    );
    if !cli.quiet && !cli.no_progress && !cli.json {
        controller.subscribe(spinner);
    }
    let mut view = UploadView::new(Arc::clone(&controller), &config, theme);

    // ── Select files ─────────────────────────────────────────────────────
    for path in &cli.files {
        let file = FileHandle::from_path(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        if let Err(rejection) = view.drop_files(vec![file]) {
            eprintln!("{} {}", theme.error("✘"), theme.error(&rejection.to_string()));
        }
    }

    // ── Submit and show ──────────────────────────────────────────────────
    view.submit().await;

    let result = controller.result();
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    } else if !cli.quiet {
        print!("{}", view.render());
    }

    if let (Some(path), Some(result)) = (&cli.output, &result) {
        save_result(result, path)
            .await
            .context("Failed to write output")?;
        if !cli.quiet {
            eprintln!("{} {}", theme.success("✔"), theme.bold(&path.display().to_string()));
        }
    }

    Ok(match controller.outcome() {
        Some(RequestOutcome::Succeeded(_)) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Map CLI args to `UploaderConfig`.
fn build_config(cli: &Cli) -> Result<UploaderConfig> {
    UploaderConfig::builder()
        .base_url(&cli.base_url)
        .upload_path(&cli.upload_path)
        .field_name(&cli.field_name)
        .max_file_size(cli.max_size)
        .request_timeout_secs(cli.timeout)
        .max_retries(cli.max_retries)
        .retry_backoff_ms(cli.retry_backoff_ms)
        .in_flight(if cli.single_flight {
            InFlightPolicy::Reject
        } else {
            InFlightPolicy::Allow
        })
        .pane_height(cli.pane_height)
        .build()
        .context("Invalid configuration")
}
