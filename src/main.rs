use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pubmed_affiliations::classifier::{
    AffiliationClassifier, CachingClassifier, KeywordClassifier, OpenAiClassifier,
};
use pubmed_affiliations::config::{find_config_file, load_config, Config};
use pubmed_affiliations::models::ResultRow;
use pubmed_affiliations::output;
use pubmed_affiliations::sources::PubMedSource;
use pubmed_affiliations::ui::{self, Spinner, Status};
use pubmed_affiliations::utils::HttpClient;
use pubmed_affiliations::PaperFetcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Column width used when rendering tables
const TABLE_CELL_WIDTH: usize = 50;

/// Fetch PubMed papers with at least one author affiliated with a company
#[derive(Parser, Debug)]
#[command(name = "get-papers-list")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch PubMed papers with pharmaceutical or biotech company authors", long_about = None)]
struct Cli {
    /// PubMed search query (full PubMed query syntax)
    query: String,

    /// Print raw API responses to stderr
    #[arg(long, short)]
    debug: bool,

    /// Write results to this CSV file instead of printing them
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Output format when printing results
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Maximum number of papers requested from the search (default: 50)
    #[arg(long, short)]
    max_results: Option<usize>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (default: 30)
    #[arg(long)]
    timeout: Option<u64>,

    /// Ask the classifier again for affiliations already seen in this run
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Classify affiliations with the built-in keyword heuristic (no API key needed)
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Abort on the first record that cannot be fetched, parsed or classified
    #[arg(long, default_value_t = false)]
    fail_fast: bool,

    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("pubmed_affiliations={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }
    let config = load_config(config_path.as_deref()).context("failed to load configuration")?;

    let fetcher = build_fetcher(&cli, &config)?;

    let spinner = if cli.quiet || cli.debug || !ui::stderr_is_terminal() {
        Spinner::hidden()
    } else {
        Spinner::new(&format!("Searching PubMed for \"{}\"", cli.query))
    };

    let result = fetcher
        .run_with_progress(&cli.query, |position, total, pubmed_id| {
            spinner.record(position, total, pubmed_id)
        })
        .await;
    spinner.finish();
    let report = result?;

    if !cli.quiet {
        ui::print_skipped(&report.skipped);
    }

    match &cli.file {
        Some(path) => {
            output::write_csv(&report.rows, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Results saved to {}", path.display());
        }
        None => {
            if report.rows.is_empty() && !cli.quiet {
                ui::print_status(
                    Status::Info,
                    &format!("No papers found for \"{}\"", cli.query),
                );
            }
            output_rows(&report.rows, cli.output)?;
        }
    }

    Ok(())
}

/// Wire the HTTP client, PubMed source and classifier together
fn build_fetcher(cli: &Cli, config: &Config) -> Result<PaperFetcher> {
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.http.timeout_secs));
    let client = Arc::new(
        HttpClient::with_settings(&config.http.user_agent, timeout)
            .context("failed to create HTTP client")?,
    );

    let source =
        PubMedSource::from_config(Arc::clone(&client), &config.pubmed).with_debug(cli.debug);

    let classifier: Arc<dyn AffiliationClassifier> = if cli.offline {
        Arc::new(KeywordClassifier::new())
    } else {
        let openai = OpenAiClassifier::from_config(
            Arc::clone(&client),
            &config.classifier,
            config.api_keys.openai.clone(),
        )
        .context("set OPENAI_API_KEY (or api_keys.openai in the config file), or pass --offline")?;
        tracing::debug!(model = openai.model(), "using chat-completion classifier");
        Arc::new(openai)
    };

    let classifier: Arc<dyn AffiliationClassifier> = if cli.no_cache || !config.classifier.cache {
        classifier
    } else {
        Arc::new(CachingClassifier::new(classifier))
    };

    Ok(PaperFetcher::new(Arc::new(source), classifier)
        .max_results(cli.max_results.unwrap_or(config.pubmed.max_results))
        .fail_fast(cli.fail_fast))
}

fn output_rows(rows: &[ResultRow], format: OutputFormat) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if ui::stdout_is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match actual_format {
        OutputFormat::Json => println!("{}", output::render_json(rows)?),
        OutputFormat::Plain => print!("{}", output::render_plain(rows)),
        OutputFormat::Table => {
            if !rows.is_empty() {
                println!("{}", output::render_table(rows, TABLE_CELL_WIDTH));
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}
