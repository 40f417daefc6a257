use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Developer CLI for inspecting assembled pages
#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Fetch, classify and print Military Matters 24/7 content as JSON", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble the home page buckets
    Home {
        /// Feed filter: all, trending or a category slug
        #[arg(short, long)]
        feed: Option<String>,
        /// Case-insensitive search over feed titles and excerpts
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Assemble the news listing
    News {
        /// Tab to show (e.g. navy, drones); unknown tabs show everything
        #[arg(short, long)]
        tab: Option<String>,
    },
    /// Load a single article by slug
    Article {
        slug: String,
    },
    /// List categories and tags
    Taxonomy,
    /// Upload a featured image to object storage
    Upload {
        file: PathBuf,
        /// Content id the image belongs to
        #[arg(long)]
        id: String,
    },
    /// Response cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove cached responses
    Clear {
        /// Only keys starting with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Drop expired rows and compact the SQLite cache
    Vacuum,
}
