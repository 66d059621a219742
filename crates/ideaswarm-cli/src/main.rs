mod config_watcher;

use clap::{Parser, Subcommand, ValueEnum};
use config_watcher::ConfigWatcher;
use ideaswarm_core::{CommunityPost, IdeaSubmission, PostKind, SwarmConfig, UserQuery};
use ideaswarm_orchestrator::{CatalogSource, Orchestrator, RuleProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ideaswarm", about = "IdeaSwarm: multi-agent idea evaluation")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "ideaswarm.toml")]
    config: PathBuf,

    /// JSON file with candidate ideas for discovery (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the background loops and run until Ctrl-C
    Run {
        /// Run one discovery cycle right after startup
        #[arg(long)]
        discover_now: bool,
    },
    /// Evaluate one idea or a JSON array of ideas
    Submit {
        /// Path to a JSON file
        file: PathBuf,
    },
    /// Run one market analysis for an idea
    Market {
        /// Path to a JSON file holding one idea
        file: PathBuf,
    },
    /// Answer a free-text question
    Query {
        text: String,
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Moderate a community post
    Moderate {
        title: String,
        content: String,
        #[arg(long, value_enum, default_value_t = PostArg::Discussion)]
        kind: PostArg,
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Run one discovery cycle
    Discover,
    /// List agents and their performance counters
    Agents,
}

#[derive(Clone, Copy, ValueEnum)]
enum PostArg {
    Discussion,
    Adaptation,
    SuccessStory,
    Question,
}

impl From<PostArg> for PostKind {
    fn from(arg: PostArg) -> Self {
        match arg {
            PostArg::Discussion => PostKind::Discussion,
            PostArg::Adaptation => PostKind::Adaptation,
            PostArg::SuccessStory => PostKind::SuccessStory,
            PostArg::Question => PostKind::Question,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config).await?;
    let mut orchestrator = Orchestrator::new(config, Arc::new(RuleProvider::new()))?;
    if let Some(path) = &cli.catalog {
        let catalog = CatalogSource::from_json_file(path)?;
        info!(path = %path.display(), ideas = catalog.len(), "Discovery catalog loaded");
        orchestrator = orchestrator.with_discovery(Arc::new(catalog));
    }
    let orchestrator = Arc::new(orchestrator);

    match cli.command {
        Commands::Run { discover_now } => {
            orchestrator.start();

            if discover_now {
                let report = orchestrator.run_daily_discovery().await;
                print_json(&report)?;
            }

            // Keep the watcher alive until shutdown.
            let _watcher = if cli.config.exists() {
                let target = orchestrator.clone();
                Some(ConfigWatcher::start(cli.config.clone(), 500, move |patch| {
                    match target.update_config(patch) {
                        Ok(_) => info!("Config reloaded"),
                        Err(e) => warn!(error = %e, "Rejected config reload"),
                    }
                })?)
            } else {
                None
            };

            info!("Swarm running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received");

            orchestrator.stop();
            print_json(&orchestrator.status().await)?;
            print_json(&orchestrator.performance_metrics().await)?;
        }
        Commands::Submit { file } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            if value.is_array() {
                let submissions: Vec<IdeaSubmission> = serde_json::from_value(value)?;
                let records = orchestrator.batch_submit(submissions).await;
                print_json(&records)?;
            } else {
                let submission: IdeaSubmission = serde_json::from_value(value)?;
                let record = orchestrator.submit_idea(submission).await;
                print_json(&record)?;
            }
        }
        Commands::Market { file } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let submission: IdeaSubmission = serde_json::from_str(&raw)?;
            let report = orchestrator.analyze_market(submission).await;
            print_json(&report)?;
        }
        Commands::Query { text, user } => {
            let answered = orchestrator.submit_query(UserQuery::new(user, text)).await;
            print_json(&answered)?;
        }
        Commands::Moderate {
            title,
            content,
            kind,
            user,
        } => {
            let post = CommunityPost::new(user, kind.into(), title, content);
            let moderated = orchestrator.moderate_content(post).await;
            print_json(&moderated)?;
        }
        Commands::Discover => {
            let report = orchestrator.run_daily_discovery().await;
            print_json(&report)?;
        }
        Commands::Agents => {
            print_json(&orchestrator.agents().await)?;
        }
    }

    let pending = orchestrator.unread_notifications();
    if !pending.is_empty() {
        info!(count = pending.len(), "Unread notifications");
        print_json(&pending)?;
    }

    Ok(())
}

/// Load the config file, or use defaults when it does not exist.
async fn load_config(path: &Path) -> anyhow::Result<SwarmConfig> {
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return Ok(SwarmConfig::default());
    }
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
    })?;
    Ok(SwarmConfig::from_toml_str(&raw)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
