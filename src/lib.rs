#![doc = "foi-torrent: incremental capture of FOI disclosure logs."]

//! Discovers new entries on government disclosure logs, downloads and
//! fingerprints their documents, packages each entry as a torrent and records
//! it in a local store.
//!
//! # Pipeline
//! [`adapters`] discover candidates and extract metadata, [`retrieve`] fetches
//! documents, [`paths`] decides where they live, [`package`] builds and seeds
//! the torrent, and [`scrape`] drives it all for one agency.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod fetch;
pub mod load_config;
pub mod package;
pub mod paths;
pub mod request;
pub mod retrieve;
pub mod scrape;
pub mod store;

pub use cli::{run, Cli, Commands};
