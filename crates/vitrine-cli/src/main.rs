mod cart;
mod catalog;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vitrine_cart::{CartStore, CartStoreOptions, Favorites, FileStore, KeyValueStore};
use vitrine_client::ApiClient;

use crate::cart::{CartCommands, FavoritesCommands};
use crate::catalog::ProductsArgs;

#[derive(Debug, Parser)]
#[command(name = "vitrine")]
#[command(about = "Storefront catalog and cart from the command line")]
struct Cli {
    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List catalog products, filtered and sorted locally
    Products(ProductsArgs),
    /// List categories, nested children indented
    Categories,
    /// Show the filter options derived from the full catalog
    Facets,
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Inspect or change the favorites list
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = vitrine_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("vitrine: no command given (see `vitrine --help`)");
        return Ok(());
    };

    let client = ApiClient::new(&config)
        .map_err(|e| anyhow::anyhow!("failed to build API client: {e}"))?;
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage_dir));

    match command {
        Commands::Products(args) => catalog::run_products(&client, &args, cli.json).await?,
        Commands::Categories => catalog::run_categories(&client, cli.json).await?,
        Commands::Facets => catalog::run_facets(&client, cli.json).await?,
        Commands::Cart { command } => {
            let store = CartStore::new(client, storage, CartStoreOptions::from_config(&config));
            cart::run_cart(&store, command, cli.json).await?;
        }
        Commands::Favorites { command } => {
            let favorites = Favorites::new(storage, config.favorites_storage_key.clone());
            cart::run_favorites(&favorites, command)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
