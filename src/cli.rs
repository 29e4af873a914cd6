use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Token;
use crate::batch;
use crate::extraction::{Dispatcher, EligibilityPolicy, Extractor, DEFAULT_QUEUE_CAPACITY};
use crate::models::{BatchReport, RepositoryKey};
use crate::providers::github::{GitHubClient, DEFAULT_API_URL};

#[derive(Parser)]
#[command(name = "repolens")]
#[command(author, version, about = "GitHub repository metadata aggregator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API token (optional, raises the rate limit)
    #[arg(short, long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Number of workers (defaults to the number of CPU cores)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Maximum number of jobs waiting for a worker
    #[arg(long, global = true, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate metadata for a single repository
    Extract {
        /// Repository as "owner/name"
        repository: RepositoryKey,

        #[command(flatten)]
        eligibility: EligibilityArgs,
    },
    /// Aggregate metadata for every repository listed in a CSV file
    Batch {
        /// CSV file with an "owner,repo" header
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        #[command(flatten)]
        eligibility: EligibilityArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct EligibilityArgs {
    /// Only aggregate repositories that pass the eligibility checks
    #[arg(short, long, default_value_t = false)]
    gated: bool,

    /// Minimum number of commits
    #[arg(long, default_value_t = 100)]
    min_commits: u64,

    /// Look-back window in days for active contributors
    #[arg(long, default_value_t = 90)]
    active_days: u32,

    /// Minimum number of distinct commit authors inside the window
    #[arg(long, default_value_t = 3)]
    min_active_contributors: usize,
}

impl EligibilityArgs {
    fn policy(&self) -> Option<EligibilityPolicy> {
        self.gated.then(|| EligibilityPolicy {
            min_commits: self.min_commits,
            active_window_days: self.active_days,
            min_active_contributors: self.min_active_contributors,
            ..EligibilityPolicy::default()
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Csv,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Extract {
                repository,
                eligibility,
            } => {
                info!("Extracting metadata for {repository}");

                let dispatcher = self.start_dispatcher(eligibility)?;
                let outcome = dispatcher.submit(repository.clone()).await;
                dispatcher.shutdown().await;

                let json_output = self.to_json(&outcome?)?;
                self.write_output(json_output.as_bytes())
            }
            Commands::Batch {
                input,
                format,
                eligibility,
            } => {
                let file = File::open(input)
                    .with_context(|| format!("failed to open {}", input.display()))?;
                let keys = batch::read_keys(file)
                    .with_context(|| format!("failed to read {}", input.display()))?;
                info!("Loaded {} repositories from {}", keys.len(), input.display());

                let dispatcher = self.start_dispatcher(eligibility)?;
                let outcomes = batch::extract_all(&dispatcher, keys).await;
                dispatcher.shutdown().await;
                let outcomes = outcomes?;

                let output = match format {
                    OutputFormat::Json => self
                        .to_json(&BatchReport {
                            total_count: outcomes.len(),
                            repositories: outcomes,
                        })?
                        .into_bytes(),
                    OutputFormat::Csv => {
                        let mut buffer = Vec::new();
                        batch::write_csv(&mut buffer, &outcomes)?;
                        buffer
                    }
                };
                self.write_output(&output)
            }
        }
    }

    fn start_dispatcher(&self, eligibility: &EligibilityArgs) -> Result<Dispatcher> {
        let token = Token::from_optional(self.token.as_deref());
        if token.is_none() {
            info!("No GitHub token configured, using anonymous access");
        }

        let client = Arc::new(GitHubClient::new(
            &self.api_url,
            token,
            Duration::from_secs(self.timeout_secs),
        )?);
        let extractor = match eligibility.policy() {
            Some(policy) => Extractor::gated(client, policy),
            None => Extractor::ungated(client),
        };

        let workers = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        });
        Ok(Dispatcher::start(
            Arc::new(extractor),
            workers,
            self.queue_capacity,
        )?)
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json_output)
    }

    fn write_output(&self, bytes: &[u8]) -> Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, bytes)?;
            info!("Results written to: {}", output_path.display());
        } else {
            println!("{}", String::from_utf8_lossy(bytes).trim_end());
        }
        Ok(())
    }
}
