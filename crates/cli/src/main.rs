use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use vetting_ballot::{LocaleSource, VettingContext};
use vetting_config::VettingConfig;
use vetting_core::{LocaleId, VoterId};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; environment variables are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vote for a value
    Vote {
        locale: String,
        path: String,
        value: String,
        #[arg(long)]
        voter: u32,
        /// Vote at the vetter weight of the voter's organization (TC and admin only)
        #[arg(long = "override")]
        override_votes: Option<u32>,
    },
    /// Record an abstention
    Abstain {
        locale: String,
        path: String,
        #[arg(long)]
        voter: u32,
    },
    /// Withdraw a vote entirely
    Unvote {
        locale: String,
        path: String,
        #[arg(long)]
        voter: u32,
    },
    /// Show the current value and status of a path
    Show { locale: String, path: String },
    /// Show every candidate for a path as JSON
    Row { locale: String, path: String },
    /// Print every resolved value of a locale
    Export {
        locale: String,
        /// Only paths starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Read from the cache file instead of resolving
        #[arg(long)]
        cached: bool,
    },
    /// Rebuild the cache files of the given locales
    RebuildCache { locales: Vec<String> },
}

fn load_config(cli: &Cli) -> Result<VettingConfig> {
    let mut config = match &cli.config {
        Some(file) => VettingConfig::from_file(file)
            .with_context(|| format!("reading configuration from {}", file.display()))?,
        None => VettingConfig::from_env().context("reading configuration from the environment")?,
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn locale(id: &str) -> Result<LocaleId> {
    LocaleId::new(id).with_context(|| format!("bad locale id {:?}", id))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    vetting_core::init_tracing(&config.log_level);

    let context = VettingContext::open(config)?;

    match &cli.command {
        Commands::Vote {
            locale: id,
            path,
            value,
            voter,
            override_votes,
        } => {
            let writer = context.writer(&locale(id)?).await?;
            let result = match override_votes {
                Some(votes) => {
                    writer
                        .vote_with_override(VoterId(*voter), path, Some(value), *votes)
                        .await?
                }
                None => writer.vote_for_value(VoterId(*voter), path, Some(value)).await?,
            };
            println!(
                "{} -> {} ({})",
                path,
                result.winning_value.as_deref().unwrap_or("<missing>"),
                result.status
            );
        }
        Commands::Abstain { locale: id, path, voter } => {
            let writer = context.writer(&locale(id)?).await?;
            let result = writer.abstain(VoterId(*voter), path).await?;
            println!("Abstained; {} is {}", path, result.status);
        }
        Commands::Unvote { locale: id, path, voter } => {
            let writer = context.writer(&locale(id)?).await?;
            if writer.unvote(VoterId(*voter), path).await? {
                println!("Vote withdrawn");
            } else {
                println!("Voter {} had no vote on {}", voter, path);
            }
        }
        Commands::Show { locale: id, path } => {
            let view = context.view(&locale(id)?).await?;
            match view.value(path) {
                Some(value) => println!("{}\t{}", value, view.status(path)),
                None => println!("<missing>"),
            }
        }
        Commands::Row { locale: id, path } => {
            let row = context.data_row(&locale(id)?, path).await?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        Commands::Export {
            locale: id,
            prefix,
            cached,
        } => {
            let id = locale(id)?;
            let view = if *cached {
                context
                    .cached_view(&id)
                    .await?
                    .with_context(|| format!("no cache file for {}", id))?
            } else {
                context.view(&id).await?
            };
            for path in view.paths() {
                if prefix.as_deref().map_or(false, |prefix| !path.starts_with(prefix)) {
                    continue;
                }
                if let Some(value) = view.value(&path) {
                    println!("{}\t{}\t{}", path, value, view.status(&path));
                }
            }
        }
        Commands::RebuildCache { locales } => {
            for id in locales {
                context.reader(&locale(id)?).await?;
            }
            let saved = context.save_caches().await?;
            info!("Rebuilt {} locale caches", saved);
            println!("Rebuilt {} locale caches", saved);
        }
    }

    Ok(())
}
