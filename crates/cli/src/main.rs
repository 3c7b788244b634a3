//! Moonjelly CLI - Drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! mj-cli catalog products
//!
//! # Add a variant to the cart and inspect it
//! mj-cli cart add variant_01... --quantity 2
//! mj-cli cart show
//!
//! # Log in and walk through checkout interactively
//! mj-cli auth login -e buyer@example.com -p secret
//! mj-cli checkout
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse products, categories and collections
//! - `cart` - Inspect and edit the active cart
//! - `region` - List regions and switch the active one
//! - `auth` - Log in, register, or end the customer session
//! - `orders` - Review past orders
//! - `checkout` - Walk through checkout for the active cart
//!
//! # Environment Variables
//!
//! - `MEDUSA_BACKEND_URL` - Base URL of the Medusa backend
//! - `MEDUSA_PUBLISHABLE_KEY` - Publishable API key for the store
//! - `MOONJELLY_DATA_DIR` - Directory for the persisted session state

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use moonjelly_storefront::config::Config;
use moonjelly_storefront::state::AppState;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "mj-cli")]
#[command(author, version, about = "Moonjelly storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products, categories and collections
    Catalog {
        #[command(subcommand)]
        target: CatalogTarget,
    },
    /// Inspect and edit the active cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List regions and switch the active one
    Region {
        #[command(subcommand)]
        action: RegionAction,
    },
    /// Log in, register, or end the customer session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Review past orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Walk through checkout for the active cart
    Checkout,
}

#[derive(Subcommand)]
enum CatalogTarget {
    /// List products with prices in the active region
    Products,
    /// Show one product with its variants
    Product {
        /// Product id (`prod_...`)
        id: String,
    },
    /// List product categories
    Categories,
    /// List collections
    Collections,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the active cart
    Show,
    /// Add a variant to the cart
    Add {
        /// Variant id (`variant_...`)
        variant_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity (0 removes the line)
    Set {
        /// Line item id
        line_item_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        /// Line item id
        line_item_id: String,
    },
    /// Apply or remove a promotion code
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },
    /// Discard the active cart
    Reset,
}

#[derive(Subcommand)]
enum PromoAction {
    /// Apply a promotion code
    Apply {
        /// The code, e.g. `TENOFF`
        code: String,
    },
    /// Remove an applied promotion code
    Remove {
        /// The code to remove
        code: String,
    },
}

#[derive(Subcommand)]
enum RegionAction {
    /// List regions offered by the store
    List,
    /// Switch the active region
    Select {
        /// Region id (`reg_...`)
        region_id: String,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register a new account
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,
    },
    /// End the session
    Logout,
    /// Show the signed-in customer
    Me,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List past orders, newest first
    List,
    /// Show one order
    Show {
        /// Order id (`order_...`)
        order_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "moonjelly_cli=info,moonjelly_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let state = AppState::from_config(&config).await?;
    state.bootstrap().await?;

    match cli.command {
        Commands::Catalog { target } => match target {
            CatalogTarget::Products => commands::catalog::products(&state).await?,
            CatalogTarget::Product { id } => commands::catalog::product(&state, &id).await?,
            CatalogTarget::Categories => commands::catalog::categories(&state).await?,
            CatalogTarget::Collections => commands::catalog::collections(&state).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await?,
            CartAction::Add {
                variant_id,
                quantity,
            } => commands::cart::add(&state, &variant_id, quantity).await?,
            CartAction::Set {
                line_item_id,
                quantity,
            } => commands::cart::set_quantity(&state, &line_item_id, quantity).await?,
            CartAction::Remove { line_item_id } => {
                commands::cart::set_quantity(&state, &line_item_id, 0).await?;
            }
            CartAction::Promo { action } => match action {
                PromoAction::Apply { code } => commands::cart::apply_promo(&state, &code).await?,
                PromoAction::Remove { code } => {
                    commands::cart::remove_promo(&state, &code).await?;
                }
            },
            CartAction::Reset => commands::cart::reset(&state).await?,
        },
        Commands::Region { action } => match action {
            RegionAction::List => commands::region::list(&state).await?,
            RegionAction::Select { region_id } => {
                commands::region::select(&state, &region_id).await?;
            }
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&state, &email, &password).await?;
            }
            AuthAction::Register {
                email,
                password,
                first_name,
                last_name,
            } => {
                commands::auth::register(&state, &email, &password, &first_name, &last_name)
                    .await?;
            }
            AuthAction::Logout => commands::auth::logout(&state).await?,
            AuthAction::Me => commands::auth::me(&state).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&state).await?,
            OrdersAction::Show { order_id } => commands::orders::show(&state, &order_id).await?,
        },
        Commands::Checkout => commands::checkout::run(&state).await?,
    }
    Ok(())
}
