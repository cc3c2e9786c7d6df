//! ShopDesk - a terminal admin console for a small retail backend.
//!
//! Signs a store manager in and offers product, order and dashboard
//! commands over the backend's REST API.

mod commands;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shopdesk_core::{ApiGateway, Config, HttpTransport, SessionManager};

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "Admin console for a small retail backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL (overrides config and SHOPDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Totals and the most recent orders
    Dashboard,
    /// Manage the product catalog
    #[command(subcommand)]
    Products(ProductCommand),
    /// Review and update orders
    #[command(subcommand)]
    Orders(OrderCommand),
}

#[derive(Subcommand)]
pub enum ProductCommand {
    /// List all products
    List,
    /// Show one product
    Show { id: i64 },
    /// Add a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Create the product hidden from the storefront
        #[arg(long)]
        inactive: bool,
    },
    /// Change fields of an existing product
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stock: Option<i64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Remove a product
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Attach an image file to a product
    UploadImage { id: i64, path: PathBuf },
}

#[derive(Subcommand)]
pub enum OrderCommand {
    /// List orders, optionally only those with a given status
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one order with its items
    Show { id: i64 },
    /// Move an order to a new status
    SetStatus { id: i64, status: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        })
        .with_env_overrides();
    if let Some(url) = cli.api_url.clone() {
        config.api_base_url = url;
    }
    debug!(api = %config.api_base_url, storage = ?config.token_storage, "Config loaded");

    let store = config.token_store()?;
    let transport = Arc::new(HttpTransport::new(config.api_base_url.clone())?);
    debug!(base_url = transport.base_url(), "HTTP transport ready");
    let session = SessionManager::new(store, transport);

    // Startup validation never fails outward; it just leaves us logged out
    session.initialize().await;
    let state = session.snapshot();
    info!(
        authenticated = state.authenticated,
        user = state.identity.as_ref().map(|i| i.display_name()),
        "Session initialized"
    );

    let navigator = Arc::new(|| {
        eprintln!("Your session has expired. Run `shopdesk login` to sign in again.");
    });
    let api = ApiGateway::new(session.clone(), navigator);
    let out = commands::Output { json: cli.json };

    let result = match cli.command {
        Command::Login { username } => commands::login(&session, &mut config, username).await,
        Command::Logout => {
            commands::logout(&session);
            Ok(())
        }
        Command::Whoami => commands::whoami(&api, &out).await,
        Command::Register {
            username,
            email,
            full_name,
        } => commands::register(&api, &out, username, email, full_name).await,
        Command::Dashboard => commands::dashboard(&api, &out).await,
        Command::Products(cmd) => commands::products(&api, &out, cmd).await,
        Command::Orders(cmd) => commands::orders(&api, &out, cmd).await,
    };
    result.map_err(commands::user_facing)
}
