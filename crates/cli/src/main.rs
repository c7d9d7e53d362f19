//! Woolery CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! woolery products --category accessories --search knit
//!
//! # Manage the cart (saved under WOOLERY_DATA_DIR between runs)
//! woolery cart add 2 --size L
//! woolery cart update 2 3 --size L
//! woolery cart show
//!
//! # Review the order, then pay
//! woolery checkout
//! woolery checkout --pay pm_card_visa
//! ```
//!
//! Backend and processor failures are reported inline; only bad arguments
//! and bad configuration make a command fail.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use woolery_client::ClientConfig;
use woolery_core::{Category, ProductId, Size};

mod render;
mod shop;

use shop::{Shop, ShopError};

#[derive(Parser)]
#[command(name = "woolery")]
#[command(author, version, about = "Woolery terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only show one category (mens, womens, kids, jewelry, accessories)
        #[arg(short, long)]
        category: Option<Category>,

        /// Only show products whose name or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Review the order and pay
    Checkout {
        /// Stripe payment method to pay with (e.g. `pm_card_visa`)
        #[arg(long, value_name = "PAYMENT_METHOD")]
        pay: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product id
        id: ProductId,

        /// Size for sized products (XS, S, M, L, XL; default M)
        #[arg(short, long)]
        size: Option<Size>,
    },
    /// Set the quantity of a line; 0 removes it
    Update {
        /// Product id
        id: ProductId,

        /// New quantity
        quantity: u32,

        /// Size of the line to change
        #[arg(short, long)]
        size: Option<Size>,
    },
    /// Remove a line
    Remove {
        /// Product id
        id: ProductId,

        /// Size of the line to remove
        #[arg(short, long)]
        size: Option<Size>,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "woolery=warn,woolery_client=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        render::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ShopError> {
    let config = ClientConfig::from_env()?;
    let mut shop = Shop::open(config);

    let result = dispatch(&mut shop, cli.command).await;
    shop.finish(result)
}

async fn dispatch(shop: &mut Shop, command: Commands) -> Result<(), ShopError> {
    match command {
        Commands::Products { category, search } => {
            shop.list_products(category, search.as_deref()).await;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => shop.show_cart(),
            CartAction::Add { id, size } => shop.add_to_cart(&id, size).await?,
            CartAction::Update { id, quantity, size } => {
                shop.update_quantity(&id, size, quantity)?;
            }
            CartAction::Remove { id, size } => shop.remove_from_cart(&id, size)?,
            CartAction::Clear => shop.clear_cart(),
        },
        Commands::Checkout { pay } => shop.checkout(pay.as_deref()).await?,
    }

    Ok(())
}
