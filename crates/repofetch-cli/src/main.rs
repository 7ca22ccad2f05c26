//! repofetch - fetch and resolve package links from the command line.
//!
//! Options come from an optional JSON config file; repository and index
//! flags given on the command line replace the file's lists.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repofetch::{Link, LinkClient, RepoOptions, Repositories};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "repofetch")]
#[command(about = "Fetch and resolve links from package repositories and indexes")]
struct Args {
    /// JSON file with repository options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Direct repository URL (repeatable, replaces configured repos)
    #[arg(long = "repo")]
    repos: Vec<String>,

    /// Package index URL (repeatable, replaces configured indexes)
    #[arg(long = "index")]
    indexes: Vec<String>,

    /// Inherit proxy settings from the environment
    #[arg(long)]
    trust_env: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Retry budget for connection failures and read timeouts
    #[arg(long)]
    max_retries: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured fetchers in search order
    Fetchers {
        /// Show the locations searched for this project
        project: Option<String>,
    },
    /// Download the content behind a link
    Open {
        link: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the canonical URL of a link
    Resolve { link: String },
}

impl Args {
    fn repo_options(&self) -> Result<RepoOptions> {
        let mut options = match &self.config {
            Some(path) => RepoOptions::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RepoOptions::default(),
        };

        if !self.repos.is_empty() {
            options.repos = self.repos.clone();
        }
        if !self.indexes.is_empty() {
            options.indexes = self.indexes.clone();
        }
        if self.trust_env {
            options.trust_env = true;
        }
        if self.insecure {
            options.verify = false;
        }
        if let Some(max_retries) = self.max_retries {
            options.max_retries = max_retries;
        }
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let repos = Repositories::new(args.repo_options()?)?;

    match &args.command {
        Command::Fetchers { project } => {
            for fetcher in repos.fetchers() {
                match project {
                    Some(project) => {
                        for url in fetcher.urls(project) {
                            println!("{}\t{}", fetcher.kind, url);
                        }
                    }
                    None => println!("{}\t{}", fetcher.kind, fetcher.base_url),
                }
            }
        }
        Command::Open { link, output } => {
            let link = Link::parse(link)?;
            let client = repos.link_client().await?;
            let mut reader = client.open(&link).await?;

            match output {
                Some(path) => {
                    let written = reader.write_to(path).await?;
                    info!("Wrote {} bytes to {}", written, path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    while let Some(chunk) = reader.chunk().await? {
                        stdout.write_all(&chunk)?;
                    }
                    stdout.flush()?;
                }
            }
        }
        Command::Resolve { link } => {
            let link = Link::parse(link)?;
            let client = repos.link_client().await?;
            println!("{}", client.resolve(&link).await?);
        }
    }

    Ok(())
}
