//! JobAlert command line
//!
//! Builds a job search URL per profile, fetches and parses the result
//! page, and records which postings each profile has already been alerted
//! about so every posting is announced once per profile.

mod errors;
mod extractor;
mod fetcher;
mod notifier;
mod processor;
mod runner;
mod search_url;

#[cfg(test)]
mod testing;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use extractor::{page_title, LinkedInExtractor, PostExtractor};
use fetcher::{FilePageFetcher, HttpPageFetcher, PageFetcher};
use jobalert_common::config::ObservabilityConfig;
use jobalert_common::db::{NewProfile, ProfileUpdate};
use jobalert_common::{metrics, AppConfig, DbPool, Repository, VERSION};
use notifier::LogNotifier;
use processor::IngestionProcessor;
use runner::ProfileRunner;
use search_url::SearchUrlBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "jobalert", version)]
#[command(about = "Job search alerts, one notification per posting and profile")]
struct Cli {
    /// Configuration file used instead of the config/ directory
    #[arg(long, global = true, env = "JOBALERT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and insert configured seed profiles
    Setup,

    /// Manage search profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Print the search URL for a profile
    SearchUrl { profile_id: Uuid },

    /// Fetch a profile's result page and save it for offline parsing
    Fetch {
        profile_id: Uuid,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the postings found in a saved result page
    Parse { file: PathBuf },

    /// Run the alert cycle for one or all profiles
    Run {
        #[arg(long)]
        profile: Option<Uuid>,
        /// Use a saved result page instead of fetching
        #[arg(long)]
        from_file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Posting and alert counts
    Stats,
}

#[derive(Subcommand)]
enum ProfileCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Search expression, e.g. '("Rust" OR "Go") AND Backend'
        #[arg(long)]
        keywords: String,
        #[arg(long)]
        location: Option<String>,
    },

    List,

    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
        /// An empty value clears the location
        #[arg(long)]
        location: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config.observability);
    metrics::register_metrics();

    info!(version = VERSION, service = %config.observability.service_name, "Starting JobAlert");

    let pool = DbPool::new(&config.database).await?;
    let repository = Repository::new(pool);
    repository.create_schema().await?;

    match cli.command {
        Commands::Setup => {
            let inserted = repository.seed_profiles(&config.profiles).await?;
            println!("Schema ready, {} profile(s) seeded", inserted);
        }
        Commands::Profile { command } => profile_command(&repository, command).await?,
        Commands::SearchUrl { profile_id } => {
            let profile = repository.get_profile(profile_id).await?;
            let urls = SearchUrlBuilder::from_config(&config.scraper)?;
            println!("{}", urls.for_profile(&profile));
        }
        Commands::Fetch { profile_id, out } => {
            let profile = repository.get_profile(profile_id).await?;
            let url = SearchUrlBuilder::from_config(&config.scraper)?.for_profile(&profile);
            let markup = HttpPageFetcher::new(&config.scraper)?.fetch(&url).await?;

            let out = out.unwrap_or_else(|| config.scraper.snapshot_path.clone());
            fetcher::save_snapshot(&out, &markup).await?;
            println!("Saved {} to {}", url, out.display());
        }
        Commands::Parse { file } => {
            let markup = fetcher::read_snapshot(&file).await?;
            let posts = LinkedInExtractor::from_config(&config.scraper)?.extract(&markup);

            println!("Title: {}", page_title(&markup).unwrap_or_else(|| "(none)".into()));
            println!("{} posting(s)", posts.len());
            for post in posts {
                println!("- {}\n  {}", post.title, post.url);
            }
        }
        Commands::Run {
            profile,
            from_file,
            json,
        } => run_command(&config, repository, profile, from_file, json).await?,
        Commands::Stats => {
            println!("Postings: {}", repository.count_postings().await?);
            println!("Alerts:   {}", repository.count_alerts(None).await?);
            for profile in repository.list_profiles().await? {
                let alerts = repository.count_alerts(Some(profile.id)).await?;
                println!("  {:<24} {}", profile.name, alerts);
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn profile_command(repository: &Repository, command: ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::Add {
            name,
            email,
            keywords,
            location,
        } => {
            let profile = repository
                .create_profile(NewProfile {
                    name,
                    notify_target: email,
                    keywords,
                    location,
                })
                .await?;
            println!("{}", profile.id);
        }
        ProfileCommands::List => {
            for p in repository.list_profiles().await? {
                println!(
                    "{}  {}  <{}>  {} @ {}",
                    p.id,
                    p.name,
                    p.notify_target,
                    p.keywords,
                    p.location.as_deref().unwrap_or("-")
                );
            }
        }
        ProfileCommands::Update {
            id,
            name,
            email,
            keywords,
            location,
        } => {
            let update = ProfileUpdate {
                name,
                notify_target: email,
                keywords,
                location,
            };
            if update.is_empty() {
                bail!("Nothing to update, pass at least one field");
            }
            let profile = repository.update_profile(id, update).await?;
            println!("Updated {}", profile.name);
        }
    }

    Ok(())
}

async fn run_command(
    config: &AppConfig,
    repository: Repository,
    profile: Option<Uuid>,
    from_file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let fetcher: Arc<dyn PageFetcher> = match from_file {
        Some(path) => Arc::new(FilePageFetcher::new(path)),
        None => Arc::new(HttpPageFetcher::new(&config.scraper)?),
    };

    let runner = ProfileRunner::new(
        repository.clone(),
        IngestionProcessor::new(repository, config.ingestion.commit_mode),
        SearchUrlBuilder::from_config(&config.scraper)?,
        fetcher,
        Arc::new(LinkedInExtractor::from_config(&config.scraper)?),
        Arc::new(LogNotifier),
    );

    match profile {
        Some(id) => {
            let summary = runner.run_profile(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{}: {} found, {} new, {} alerted",
                    summary.profile_name,
                    summary.extracted,
                    summary.report.new_postings,
                    summary.delivered
                );
            }
        }
        None => {
            let outcomes = runner.run_all().await?;
            let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    match (&outcome.summary, &outcome.error) {
                        (Some(s), _) => println!(
                            "{}: {} found, {} new, {} alerted",
                            outcome.profile_name, s.extracted, s.report.new_postings, s.delivered
                        ),
                        (None, Some(e)) => println!("{}: failed: {}", outcome.profile_name, e),
                        (None, None) => {}
                    }
                }
            }

            if failed > 0 {
                warn!(failed, total = outcomes.len(), "Some profiles failed");
            }
        }
    }

    Ok(())
}
