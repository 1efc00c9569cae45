use adscan::{ConcurrencyMode, ScanConfig, Scanner, run_until_signal};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status used when a scan is interrupted by a signal
const INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "adscan",
    version,
    about = "Detect third-party ad-technology integrations across large URL sets"
)]
struct Cli {
    /// Path to a JSON config file; flags below override its values
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Local file with URLs (text, JSON, YAML, CSV or TSV)
    #[arg(long, conflicts_with = "repo")]
    file: Option<PathBuf>,

    /// Repository reference (owner/repo, repository URL, or a direct file link)
    #[arg(long)]
    repo: Option<String>,

    /// Maximum number of URLs taken from a repository
    #[arg(long)]
    max_results: Option<usize>,

    /// Concurrency mode: sequential or pooled
    #[arg(long)]
    mode: Option<ConcurrencyMode>,

    /// Maximum concurrent page visits in pooled mode
    #[arg(long)]
    max_parallelism: Option<usize>,

    /// Per-visit timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// 1-based inclusive range of URLs to process ("start-end", "start-", "-end")
    #[arg(long, allow_hyphen_values = true)]
    range: Option<String>,

    /// URLs dispatched and persisted per round
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Root directory of the dated record store
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory for the per-category URL logs
    #[arg(long)]
    error_dir: Option<PathBuf>,

    /// Page inspector executable (default: adscan-inspect on PATH)
    #[arg(long)]
    inspector: Option<PathBuf>,

    /// Extra argument passed to the inspector before the URL (repeatable)
    #[arg(long = "inspector-arg")]
    inspector_args: Vec<String>,

    /// Repository API token (falls back to GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Log level for adscan (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Overlay command-line values on a loaded configuration
    fn apply_to(self, config: &mut ScanConfig) {
        if let Some(file) = self.file {
            config.source.file = Some(file);
            config.source.repository = None;
        }
        if let Some(repo) = self.repo {
            config.source.repository = Some(repo);
            config.source.file = None;
        }
        if self.max_results.is_some() {
            config.source.max_results = self.max_results;
        }

        let execution = &mut config.execution;
        if let Some(mode) = self.mode {
            execution.mode = mode;
        }
        if let Some(max_parallelism) = self.max_parallelism {
            execution.max_parallelism = max_parallelism;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            execution.visit_timeout_ms = timeout_ms;
        }
        if self.range.is_some() {
            execution.range = self.range;
        }
        if self.chunk_size.is_some() {
            execution.chunk_size = self.chunk_size;
        }

        if let Some(output_dir) = self.output_dir {
            config.output.output_dir = output_dir;
        }
        if let Some(error_dir) = self.error_dir {
            config.output.error_dir = error_dir;
        }

        if self.inspector.is_some() {
            config.inspector.program = self.inspector;
        }
        if !self.inspector_args.is_empty() {
            config.inspector.args = self.inspector_args;
        }

        if let Some(token) = self.token.or_else(|| std::env::var("GITHUB_TOKEN").ok()) {
            config.repository.token = Some(token);
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(format!("adscan={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adscan=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut config = match &cli.config {
        Some(path) => match ScanConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => ScanConfig::default(),
    };
    cli.apply_to(&mut config);

    let scanner = match Scanner::from_config(config) {
        Ok(scanner) => scanner,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Cannot start scan");
            return ExitCode::FAILURE;
        }
    };

    match run_until_signal(&scanner).await {
        Ok(Some(summary)) => {
            tracing::info!(
                urls_in_scope = summary.urls_in_scope,
                chunks = summary.chunks_processed,
                succeeded = summary.succeeded,
                no_signal = summary.no_signal,
                navigation_errors = summary.navigation_errors,
                processing_errors = summary.processing_errors,
                records_written = summary.records_written,
                "Run summary"
            );
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::from(INTERRUPTED),
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Scan aborted");
            ExitCode::FAILURE
        }
    }
}
