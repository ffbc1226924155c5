//! Cart and favorites command handlers.
//!
//! Each invocation initializes the cart store first, so the command runs
//! against the remote cart when `VITRINE_SESSION_TOKEN` carries a valid
//! session and against the cart saved on this machine otherwise.

use clap::Subcommand;
use vitrine_cart::{CartStore, Favorites};
use vitrine_client::ProductQuery;
use vitrine_core::{Cart, Product};

use crate::catalog::product_line;

/// Sub-commands available under `cart`.
#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Show the cart lines and totals
    Show,
    /// Add a product to the cart
    Add {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove one cart line (size and color must match exactly)
    Remove {
        product_id: String,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Set the quantity of a cart line; zero or less removes it
    Update {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        qty: i64,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove every line
    Clear,
}

/// Sub-commands available under `favorites`.
#[derive(Debug, Subcommand)]
pub enum FavoritesCommands {
    /// List favorite product ids
    List,
    /// Add or remove a product id
    Toggle { product_id: String },
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("cart is empty");
        return;
    }
    for item in cart.items() {
        let variant: Vec<&str> = [item.size.as_deref(), item.color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        let variant = if variant.is_empty() {
            String::new()
        } else {
            format!(" ({})", variant.join(", "))
        };
        println!(
            "{} x{}{variant}  = {:.2}",
            product_line(&item.product),
            item.quantity,
            item.line_total()
        );
    }
    println!(
        "{} lines, {} items, total {:.2}",
        cart.item_count(),
        cart.total_quantity(),
        cart.total_price()
    );
}

/// Looks the product up in the catalog so the stored line carries its
/// current name and price.
async fn find_product(store: &CartStore, product_id: &str) -> anyhow::Result<Product> {
    let fetched = store.client().fetch_products(&ProductQuery::default()).await?;
    fetched
        .items
        .into_iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| anyhow::anyhow!("product '{product_id}' not found in the catalog"))
}

/// Run one cart sub-command and print the resulting cart.
///
/// # Errors
///
/// Returns an error if the store cannot be initialized, the product to add
/// is unknown, or the backing store rejects the change.
pub(crate) async fn run_cart(
    store: &CartStore,
    command: CartCommands,
    json: bool,
) -> anyhow::Result<()> {
    let mode = store.initialize().await?;
    tracing::debug!(%mode, "cart store ready");

    match command {
        CartCommands::Show => {}
        CartCommands::Add {
            product_id,
            qty,
            size,
            color,
        } => {
            let product = find_product(store, &product_id).await?;
            store
                .add_item(&product, qty, size.as_deref(), color.as_deref())
                .await?;
        }
        CartCommands::Remove {
            product_id,
            size,
            color,
        } => {
            store
                .remove_item(&product_id, size.as_deref(), color.as_deref())
                .await?;
        }
        CartCommands::Update {
            product_id,
            qty,
            size,
            color,
        } => {
            if !store.is_in_cart(&product_id, size.as_deref(), color.as_deref()) {
                eprintln!("warning: no cart line for '{product_id}' with that size/color");
            }
            store
                .update_quantity(&product_id, qty, size.as_deref(), color.as_deref())
                .await?;
        }
        CartCommands::Clear => store.clear_cart().await?,
    }

    let cart = store.cart();
    if json {
        println!("{}", serde_json::to_string_pretty(cart.items())?);
    } else {
        println!("[{mode}]");
        print_cart(&cart);
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the favorites list cannot be read or written.
pub(crate) fn run_favorites(
    favorites: &Favorites,
    command: FavoritesCommands,
) -> anyhow::Result<()> {
    match command {
        FavoritesCommands::List => {
            let ids = favorites.ids()?;
            if ids.is_empty() {
                println!("no favorites yet");
            }
            for id in ids {
                println!("{id}");
            }
        }
        FavoritesCommands::Toggle { product_id } => {
            if favorites.toggle(&product_id)? {
                println!("added {product_id} to favorites");
            } else {
                println!("removed {product_id} from favorites");
            }
        }
    }
    Ok(())
}
