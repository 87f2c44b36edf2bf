//! Command-line entry point: HTTP service, offline scoring and exports.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use persona_profile::Config;
use persona_profile::export::{build_submission_csv, build_submission_json};
use persona_profile::notify::SubmissionNotifier;
use persona_profile::scoring::score_answers;
use persona_profile::store::{
    JsonlSubmissionStore, SubmissionStore, filter_by_test_version, parse_limit,
};
use persona_profile::validation::validate_submission;
use persona_profile::web::{AppState, start_server};

#[derive(Parser)]
#[command(
    name = "persona-profile",
    version,
    about = "Leadership personality assessment scoring service"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default).
    Serve,

    /// Score a submission payload and print the profile. Nothing is stored
    /// or emailed.
    Score {
        /// JSON payload file, or "-" for stdin.
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },

    /// Print stored submissions.
    Export {
        /// Output format.
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Maximum number of records, newest first.
        #[arg(long)]
        limit: Option<String>,

        /// Only include this test version.
        #[arg(long)]
        test_version: Option<String>,
    },
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

const DEFAULT_EXPORT_LIMIT: usize = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await?,
        Commands::Score { input } => {
            let raw = read_input(&input)?;
            let payload: serde_json::Value = serde_json::from_str(&raw)?;
            let submission = validate_submission(&payload, &config.scoring)?;
            let profile = score_answers(
                &submission.answers,
                submission.duration_minutes,
                config.scoring.min_duration_minutes,
                &submission.known_assessments,
            );
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Export {
            format,
            limit,
            test_version,
        } => {
            let store = JsonlSubmissionStore::new(&config.store.path);
            let limit = parse_limit(limit.as_deref(), DEFAULT_EXPORT_LIMIT);
            let rows = filter_by_test_version(
                store.recent(limit).await?,
                test_version.as_deref().unwrap_or_default(),
            );
            match format {
                ExportFormat::Csv => println!("{}", build_submission_csv(&rows)),
                ExportFormat::Json => println!("{}", build_submission_json(&rows)?),
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("persona_profile=info,tower_http=warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let store: Arc<dyn SubmissionStore> = Arc::new(JsonlSubmissionStore::new(&config.store.path));

    let notifier = config.email.as_ref().map(|email| {
        tracing::info!(to = %email.to, "Submission emails enabled");
        Arc::new(SubmissionNotifier::gmail(email))
    });
    if notifier.is_none() {
        tracing::info!("Email credentials not configured; submissions will not be emailed");
    }

    tracing::info!(
        store = %config.store.path.display(),
        min_duration_minutes = config.scoring.min_duration_minutes,
        "Starting personality backend"
    );

    let state = Arc::new(AppState::new(&config, store, notifier));
    start_server(addr, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
