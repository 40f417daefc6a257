mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cli::{CacheAction, Cli, Commands};
use newsdesk::{logging, Config, Newsdesk};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    logging::init(&config.log_level, config.log_format);
    let desk = Newsdesk::connect(&config).await?;

    match cli.command {
        Commands::Home { feed, query } => print_json(&desk.home_feed(feed.as_deref(), query.as_deref()).await?),
        Commands::News { tab } => print_json(&desk.news(tab.as_deref()).await?),
        Commands::Article { slug } => print_json(&desk.article(&slug).await?),
        Commands::Taxonomy => print_json(&desk.taxonomy().await?),
        Commands::Upload { file, id } => {
            let bytes = tokio::fs::read(&file).await.with_context(|| format!("reading {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("{} has no file name", file.display()))?;
            let url = desk.upload(&id, filename, bytes).await?;
            print_json(&serde_json::json!({ "id": id, "url": url }))
        }
        Commands::Cache { action: CacheAction::Clear { prefix } } => {
            let removed = desk.clear_cache_prefix(prefix.as_deref()).await?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        Commands::Cache { action: CacheAction::Vacuum } => {
            let purged = desk.vacuum_cache().await?;
            print_json(&serde_json::json!({ "persistent": purged.is_some(), "purged": purged.unwrap_or(0) }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
