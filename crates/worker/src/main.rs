use anyhow::Context;
use brokerpick_core::config::{parse_recommendation_list, Settings};
use brokerpick_core::ingest::FileRecordSource;
use brokerpick_core::invocation::{build_artifact, persist_artifact};
use brokerpick_core::pipeline::filter::FilterOptions;
use brokerpick_core::storage::{self, retention};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod mock;

#[derive(Debug, Parser)]
#[command(name = "brokerpick_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank a recommendations file and save the report.
    Run {
        /// Source file. Defaults to BROKER_DATA_FILE.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Window reference date (YYYY-MM-DD). Defaults to today's UTC date.
        #[arg(long)]
        as_of_date: Option<String>,

        #[arg(long)]
        window_days: Option<i64>,

        /// Comma separated labels, e.g. "Buy,Sell".
        #[arg(long)]
        allow: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Print the report without saving it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Write deterministic mock recommendation data.
    Mock {
        /// Defaults to BROKER_DATA_FILE.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = 100)]
        count: usize,

        #[arg(long)]
        as_of_date: Option<String>,
    },

    /// Delete saved reports older than the retention period.
    Cleanup {
        /// Defaults to REPORT_RETENTION_DAYS.
        #[arg(long)]
        older_than_days: Option<i64>,

        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Run {
            input,
            as_of_date,
            window_days,
            allow,
            format,
            dry_run,
        } => {
            let input = input.unwrap_or_else(|| PathBuf::from(&settings.data_file));
            let options = resolve_options(&settings, window_days, allow.as_deref())?;
            run_report(&settings, input, as_of_date.as_deref(), options, format, dry_run).await
        }
        Command::Mock {
            output,
            count,
            as_of_date,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&settings.data_file));
            let as_of_date = brokerpick_core::time::resolve_as_of_date(
                as_of_date.as_deref(),
                chrono::Utc::now(),
            )?;
            let rows = mock::generate_mock_rows(as_of_date, count);
            mock::write_mock_csv(&output, &rows)?;
            tracing::info!(
                path = %output.display(),
                rows = rows.len(),
                %as_of_date,
                "mock data written"
            );
            Ok(())
        }
        Command::Cleanup {
            older_than_days,
            dry_run,
        } => {
            let days = older_than_days.unwrap_or(settings.retention_days);
            let store = storage::from_settings(&settings)?;
            let expired = retention::cleanup_older_than(
                store.as_ref(),
                &settings.report_prefix,
                days,
                chrono::Utc::now(),
                dry_run,
            )
            .await?;
            for key in &expired {
                println!("{}{key}", if dry_run { "would delete " } else { "deleted " });
            }
            Ok(())
        }
    };

    // main prints the returned error; sentry gets it once, here.
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

fn resolve_options(
    settings: &Settings,
    window_days: Option<i64>,
    allow: Option<&str>,
) -> anyhow::Result<FilterOptions> {
    let allowed = match allow {
        Some(s) => parse_recommendation_list(s),
        None => settings.allowed_recommendations.clone(),
    };
    FilterOptions::new(window_days.unwrap_or(settings.window_days), allowed)
}

async fn run_report(
    settings: &Settings,
    input: PathBuf,
    as_of_date: Option<&str>,
    options: FilterOptions,
    format: OutputFormat,
    dry_run: bool,
) -> anyhow::Result<()> {
    let now = chrono::Utc::now();
    let as_of_date = brokerpick_core::time::resolve_as_of_date(as_of_date, now)?;
    let run_id = uuid::Uuid::new_v4();

    let source = FileRecordSource::new(input);
    let artifact = build_artifact(&source, &options, as_of_date, run_id, now).await?;

    match format {
        OutputFormat::Table => print!("{}", artifact.report.render_table()),
        OutputFormat::Json => println!("{}", artifact.report.to_json_pretty()?),
    }

    if dry_run {
        tracing::info!(%as_of_date, dry_run = true, "report not saved");
        return Ok(());
    }

    let store = storage::from_settings(settings)?;
    let location = persist_artifact(store.as_ref(), &settings.report_prefix, &artifact)
        .await
        .context("report run finished but the report could not be saved")?;
    tracing::info!(%as_of_date, %location, %run_id, "report saved");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
