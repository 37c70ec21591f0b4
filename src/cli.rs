use std::path::PathBuf;

use clap::{Parser, Subcommand};

use catalog_crawler::{KeyFilter, StrategyKind};

#[derive(Parser, Debug)]
#[command(
    name = "catalog-crawler",
    version,
    about = "Crawl a paginated game catalog into a local database"
)]
pub struct Cli {
    /// Settings file, `settings.json` next to the executable by default
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover items and store their details
    Crawl {
        #[arg(long, value_enum)]
        strategy: StrategyKind,

        /// Category to start from, e.g. `dos` for the platform strategy
        #[arg(long)]
        category: Option<String>,

        /// First listing page to visit
        #[arg(long)]
        page: Option<u32>,

        /// Stop discovery after this many listing pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Also download screenshots and files
        #[arg(long)]
        download: bool,

        /// Search: part of the item name
        #[arg(long)]
        name: Option<String>,

        /// Search: platform slug
        #[arg(long)]
        platform: Option<String>,

        /// Search: release year
        #[arg(long)]
        year: Option<u16>,

        /// Search: minimum rating, e.g. 4.5
        #[arg(long)]
        rating: Option<f32>,
    },

    /// Query stored items
    Items {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Inspect and maintain the caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List keys of the index cache
    Keys {
        #[arg(long, value_enum, default_value_t = KeyFilter::All)]
        filter: KeyFilter,
    },
    /// Remove expired entries
    Purge,
    /// Renew the lifetime of every valid entry
    Extend,
}
