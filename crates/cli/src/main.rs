//! Seattle Trading CLI - Command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! st-cli catalog list --category Medical --sort price-asc
//!
//! # Fill the cart
//! st-cli cart add us-2000-pro-3.5-ice-blue
//! st-cli cart set us-2000-pro-3.5-ice-blue 2
//!
//! # Quote tax, then pay
//! st-cli checkout --name "Ada Lovelace" --line1 "1 Pike St" --city Seattle \
//!     --state WA --postal-code 98101 --quote-only
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse products
//! - `cart` - Edit the persisted cart
//! - `checkout` - Quote tax and pay
//! - `account` - Local profile and order history
//! - `theme` - Color theme preference

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seattle_trading_core::Theme;
use seattle_trading_storefront::catalog::{CatalogQuery, SortOrder};
use seattle_trading_storefront::config::StorefrontConfig;

mod commands;

use commands::Storefront;
use commands::checkout::CheckoutArgs;

#[derive(Parser)]
#[command(name = "st-cli")]
#[command(author, version, about = "Seattle Trading storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Quote tax for the cart and pay
    Checkout(CheckoutArgs),
    /// Manage the local profile
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Color theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products, optionally filtered
    List {
        /// Name contains (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        material: Option<String>,

        /// `popular`, `price-asc`, or `price-desc`
        #[arg(long, default_value = "popular")]
        sort: SortOrder,
    },
    /// List bestsellers
    Bestsellers,
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add { id: String },
    /// Set a line's quantity
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Show the cart
    Show,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Sign in
    Login {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,
    },
    /// Show the profile
    Show,
    /// Change name and email
    Update {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,
    },
    /// Sign out
    Logout,
    /// List past orders
    Orders,
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show the saved theme
    Show,
    /// Flip between light and dark
    Toggle,
    /// Save a theme (`light` or `dark`)
    Set { theme: Theme },
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

    tracing::debug!("Sentry initialized");
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

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "seattle_trading_storefront=info,seattle_trading_cli=info".into());

    // JSON lines for log shippers, plain text for terminals
    let json = std::env::var("STOREFRONT_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = Storefront::open(config).inspect_err(commands::CommandError::report)?;

    let result = match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                search,
                size,
                category,
                brand,
                material,
                sort,
            } => {
                let query = CatalogQuery {
                    text: search,
                    size,
                    category,
                    brand,
                    material,
                    sort,
                };
                commands::catalog::list(&storefront, &query);
                Ok(())
            }
            CatalogAction::Bestsellers => {
                commands::catalog::bestsellers(&storefront);
                Ok(())
            }
            CatalogAction::Show { id } => commands::catalog::show(&storefront, &id),
        },
        Commands::Cart { action } => match action {
            CartAction::Add { id } => commands::cart::add(&storefront, &id),
            CartAction::Set { id, quantity } => commands::cart::set(&storefront, &id, quantity),
            CartAction::Remove { id } => commands::cart::remove(&storefront, &id),
            CartAction::Clear => commands::cart::clear(&storefront),
            CartAction::Show => commands::cart::show(&storefront),
        },
        Commands::Checkout(args) => commands::checkout::run(storefront, args).await,
        Commands::Account { action } => match action {
            AccountAction::Login { name, email } => {
                commands::account::login(&storefront, &name, &email)
            }
            AccountAction::Show => commands::account::show(&storefront),
            AccountAction::Update { name, email } => {
                commands::account::update(&storefront, &name, &email)
            }
            AccountAction::Logout => commands::account::logout(&storefront),
            AccountAction::Orders => commands::account::orders(&storefront),
        },
        Commands::Theme { action } => match action {
            ThemeAction::Show => commands::theme::show(&storefront),
            ThemeAction::Toggle => commands::theme::toggle(&storefront),
            ThemeAction::Set { theme } => commands::theme::set(&storefront, theme),
        },
    };

    result.inspect_err(commands::CommandError::report)?;
    Ok(())
}
