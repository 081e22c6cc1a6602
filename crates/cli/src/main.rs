//! Bazaar CLI - browse the catalog, manage a cart and check out from a shell.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! bazaar products --category Hogar
//! bazaar search mate --sort price-low
//! bazaar show 12
//!
//! # Cart (persisted in the session file between runs)
//! bazaar cart add 12 -q 2
//! bazaar cart update 12 5
//! bazaar cart checkout
//!
//! # Sell (requires `bazaar login`)
//! bazaar sell create --name Termo --category Hogar --price 25000 --stock 4 \
//!     --description "Termo de acero inoxidable de un litro"
//! bazaar sell stock 12 --subtract 1
//! ```
//!
//! Configuration is read from the environment; see
//! [`bazaar_storefront::config`]. Set `BAZAAR_SEED_PATH` to work offline
//! against a local `db.json`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::error::StoreError;
use bazaar_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, optionally in one category
    Products {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories with their product counts
    Categories,
    /// Search the catalog
    Search(SearchArgs),
    /// Show one product, fetching it if it is not in the catalog
    Show { id: i64 },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage your own listings
    Sell {
        #[command(subcommand)]
        action: SellAction,
    },
    /// Record the logged-in user in the session
    Login(LoginArgs),
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[derive(Args)]
struct SearchArgs {
    term: String,

    /// Show inline suggestions instead of the results page
    #[arg(long, conflicts_with_all = ["category", "sort"])]
    suggest: bool,

    /// Keep only results in this category
    #[arg(short, long)]
    category: Option<String>,

    /// `relevance`, `price-low`, `price-high` or `name`
    #[arg(short, long, default_value = "relevance")]
    sort: String,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its total
    Show,
    /// Add a product
    Add {
        id: i64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line item's quantity; 0 or less removes it
    Update {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product
    Remove { id: i64 },
    /// Empty the cart
    Clear,
    /// Check the cart against current stock
    Validate,
    /// Buy everything in the cart
    Checkout,
}

#[derive(Subcommand)]
enum SellAction {
    /// List a new product
    Create(ListingArgs),
    /// Change the stock of one of your products
    Stock(StockArgs),
    /// Delete a product
    Delete { id: i64 },
    /// List your products
    Mine,
}

#[derive(Args)]
struct ListingArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    category: String,
    /// Price in major units, e.g. `19.99`
    #[arg(long)]
    price: String,
    #[arg(long)]
    stock: String,
    /// Image URL; repeat for more than one
    #[arg(long = "image")]
    images: Vec<String>,
}

#[derive(Args)]
struct StockArgs {
    id: i64,
    #[command(flatten)]
    change: StockChange,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct StockChange {
    #[arg(long)]
    add: Option<u32>,
    #[arg(long)]
    subtract: Option<u32>,
    /// New stock; must be a whole number, 0 or more
    #[arg(long)]
    set: Option<String>,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays clean.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_storefront=info,bazaar_cli=info".into());
    let json = std::env::var("BAZAAR_LOG_JSON").is_ok_and(|v| v == "1");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => commands::fail(&StoreError::from(e)),
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => commands::fail(&e),
    };

    if let Err(e) = run(cli, &state).await {
        commands::fail(&e);
    }
}

async fn run(cli: Cli, state: &AppState) -> Result<(), StoreError> {
    match cli.command {
        Commands::Login(args) => commands::session::login(state, args),
        Commands::Logout => commands::session::logout(state),
        Commands::Whoami => commands::session::whoami(state),
        command => {
            state.start().await?;
            dispatch(state, command).await
        }
    }
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), StoreError> {
    match command {
        Commands::Products { category } => commands::catalog::products(state, category.as_deref()),
        Commands::Categories => commands::catalog::categories(state),
        Commands::Search(args) => commands::catalog::search(state, &args),
        Commands::Show { id } => commands::catalog::show(state, id).await,
        Commands::Cart { action } => commands::cart::run(state, action).await,
        Commands::Sell { action } => commands::sell::run(state, action).await,
        Commands::Login(_) | Commands::Logout | Commands::Whoami => Ok(()),
    }
}
