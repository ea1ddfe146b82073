use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::adapter_for;
use crate::fetch::HttpFetcher;
use crate::load_config::load_or_default;
use crate::package::CommandPackager;
use crate::request::Organisation;
use crate::scrape::Scraper;
use crate::store::JsonFileStore;

/// CLI for foi-torrent: capture new FOI disclosure-log entries as torrents.
#[derive(Parser)]
#[clap(
    name = "foi-torrent",
    version,
    about = "Scrape FOI disclosure logs, download released documents and package them as torrents"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one discovery pass for an agency and capture every new request
    Scrape {
        /// Agency whose disclosure log to scrape
        #[clap(value_enum)]
        agency: Organisation,
        /// Path to a YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Scan the whole AGD log oldest-first to pick up entries earlier runs missed
        #[clap(long)]
        find_missing: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scrape {
            agency,
            config,
            find_missing,
        } => {
            let config = load_or_default(config.as_deref())?;
            if find_missing && agency != Organisation::Agd {
                tracing::warn!(%agency, "--find-missing only applies to agd, ignoring");
            }

            let fetcher = HttpFetcher::new(&config.http).context("building HTTP client")?;
            let store = JsonFileStore::open(&config.storage.store_path)
                .context("opening record store")?;
            let packager = CommandPackager::new(
                config.storage.archive_root.clone(),
                config.packaging.clone(),
                config.announce.clone(),
            );
            let scraper = Scraper::new(&fetcher, &store, &packager, config.storage.path_root.clone());
            let adapter = adapter_for(agency, find_missing);

            println!("Scrape starting...");
            match scraper.scrape(adapter.as_ref()).await {
                Ok(report) => {
                    println!("Scrape complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Scrape failed: {}", e);
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
