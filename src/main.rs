// catalog-crawler: command line front end of the catalog crawler library.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use catalog_crawler::cache::{extend_cache_lifetime, index_cache_keys, purge_caches};
use catalog_crawler::{
    CrawlRequest, ItemFilter, ItemRepository, LogProgress, PathContext, SearchFilter, Settings,
    load_settings, resolve_settings_path, run_crawl,
};
use cli::{CacheAction, Cli, Commands};

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = PathContext::current().context("Failed to resolve process directories")?;
    let settings_path = resolve_settings_path(cli.config.as_deref(), &ctx);
    let settings = load_settings(&settings_path, &ctx)
        .await
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    init_logging(&settings);

    match cli.command {
        Commands::Crawl {
            strategy,
            category,
            page,
            max_pages,
            download,
            name,
            platform,
            year,
            rating,
        } => {
            let request = CrawlRequest {
                strategy,
                category,
                start_page: page,
                max_pages,
                download,
                filter: SearchFilter {
                    name,
                    platform,
                    year,
                    rating,
                },
            };

            let stop = CancellationToken::new();
            let on_signal = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping after the current page");
                    on_signal.cancel();
                }
            });

            let summary = run_crawl(&settings, request, Arc::new(LogProgress), stop).await?;
            println!(
                "{} items discovered on {} pages, {} stored, {} failed",
                summary.discovered, summary.pages, summary.stats.completed, summary.stats.failed
            );
        }

        Commands::Items {
            name,
            platform,
            year,
            limit,
        } => {
            let repository = ItemRepository::open(&settings.item_database_path()).await?;
            let items = repository
                .search(&ItemFilter {
                    name,
                    platform,
                    year,
                    limit: Some(limit),
                    ..ItemFilter::default()
                })
                .await;
            repository.close().await;
            for item in items? {
                println!(
                    "{:>6}  {:<40}  {:<12}  {}",
                    item.id,
                    item.name.as_deref().unwrap_or("?"),
                    item.platform.as_deref().unwrap_or("-"),
                    item.year.map(|y| y.to_string()).unwrap_or_default()
                );
            }
        }

        Commands::Cache { action } => match action {
            CacheAction::Keys { filter } => {
                for key in index_cache_keys(&settings, filter).await? {
                    println!("{key}");
                }
            }
            CacheAction::Purge => {
                let (index, item) = purge_caches(&settings).await?;
                println!(
                    "index: {} of {} removed, item: {} of {} removed",
                    index.removed, index.existing, item.removed, item.existing
                );
            }
            CacheAction::Extend => {
                let (index, item) = extend_cache_lifetime(&settings).await?;
                println!("index: {index} extended, item: {item} extended");
            }
        },
    }

    info!("Done");
    Ok(())
}
