//! Rightsizer CLI
//!
//! Queries scope summaries and stored recommendations from a rightsizer
//! server, or computes recommendations locally from interval data.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use commands::{recommend, recommendations, summarize};
use engine_lib::RecommendationFilter;
use std::path::PathBuf;

/// Rightsizer CLI
#[derive(Parser)]
#[command(name = "rsz")]
#[command(author, version, about = "CLI for the Rightsizer recommendation engine", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via RSZ_API_URL env var)
    #[arg(long, env = "RSZ_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize recommendations for a cluster or namespace
    Summarize {
        /// Scope type: cluster or namespace
        #[arg(long = "type", short = 't', default_value = "cluster")]
        summarize_type: String,

        /// Cluster name (all clusters if omitted)
        #[arg(long, short)]
        cluster: Option<String>,

        /// Namespace name (all namespaces if omitted)
        #[arg(long, short)]
        namespace: Option<String>,

        /// Drop cached summaries and recompute
        #[arg(long)]
        fetch_fresh: bool,
    },

    /// Compute recommendations locally from an interval-data JSON file
    Recommend {
        /// Workload document with a `metrics` array
        file: PathBuf,

        /// Duration sub-categories as name:days,name:days
        #[arg(long, env = "RSZ_SUB_CATEGORIES")]
        sub_categories: Option<String>,

        /// As-of timestamp (RFC 3339); defaults to each container's latest interval
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },

    /// List stored recommendations
    Recommendations {
        /// Filter by cluster
        #[arg(long, short)]
        cluster: Option<String>,

        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Filter by workload name
        #[arg(long, short)]
        workload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;
    let format = config.format(cli.format)?;

    match cli.command {
        Commands::Summarize {
            summarize_type,
            cluster,
            namespace,
            fetch_fresh,
        } => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            summarize::summarize(&client, summarize_type, cluster, namespace, fetch_fresh, format)
                .await?;
        }
        Commands::Recommend {
            file,
            sub_categories,
            as_of,
        } => {
            recommend::recommend(&file, config.sub_categories(sub_categories), as_of, format)?;
        }
        Commands::Recommendations {
            cluster,
            namespace,
            workload,
        } => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            let filter = RecommendationFilter {
                cluster_name: cluster,
                namespace_name: namespace,
                workload_name: workload,
            };
            recommendations::list_recommendations(&client, filter, format).await?;
        }
    }

    Ok(())
}
