mod import;
mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricecmp-cli")]
#[command(about = "Grocery price comparison command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upsert the chain catalog into the database
    Seed,
    /// Import normalized price records from a JSON file
    Import {
        /// Path to a JSON array of price records
        path: PathBuf,
    },
    /// Search products by name in one city
    Search {
        /// City to search in (aliases such as "Tel Aviv" are accepted)
        #[arg(long)]
        city: String,
        /// Maximum number of products to print
        #[arg(long)]
        limit: Option<usize>,
        /// Free-text query words
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Compare a cart across chains in one city
    Compare {
        /// City to compare in
        #[arg(long)]
        city: String,
        /// Cart items as `key` or `key:quantity`; keys are barcodes or names
        #[arg(required = true, num_args = 1..)]
        items: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pricecmp-cli: run with --help to list commands");
        return Ok(());
    };

    let config = pricecmp_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = pricecmp_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Migrate => {
            let applied = pricecmp_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations run");
            println!("{}", migration_summary(applied));
        }
        Commands::Seed => {
            let catalog = pricecmp_core::load_catalog(&config.catalog_path)?;
            let seeded = pricecmp_db::seed_chains(&pool, &catalog.chains).await?;
            tracing::info!(seeded, path = %config.catalog_path.display(), "chains seeded");
            println!("seeded {seeded} chains");
        }
        Commands::Import { path } => {
            let catalog = pricecmp_core::load_catalog(&config.catalog_path)?;
            import::run_import(&pool, &catalog.city_aliases(), &path).await?;
        }
        Commands::Search { city, limit, query } => {
            let catalog = pricecmp_core::load_catalog(&config.catalog_path)?;
            let limit = limit
                .unwrap_or(config.search_default_limit)
                .clamp(1, config.search_max_limit.max(1));
            query::run_search(&pool, &catalog.city_aliases(), &city, &query.join(" "), limit)
                .await?;
        }
        Commands::Compare { city, items } => {
            let catalog = pricecmp_core::load_catalog(&config.catalog_path)?;
            let items = items
                .iter()
                .map(|arg| query::parse_cart_arg(arg))
                .collect::<anyhow::Result<Vec<_>>>()?;
            query::run_compare(&pool, &catalog.city_aliases(), &city, &items).await?;
        }
    }

    pool.close().await;
    Ok(())
}

fn migration_summary(applied: usize) -> String {
    match applied {
        0 => "database schema is up to date".to_string(),
        1 => "1 new migration applied".to_string(),
        n => format!("{n} new migrations applied"),
    }
}

#[cfg(test)]
mod tests;
