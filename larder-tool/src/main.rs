mod commands;
mod config;
mod error;
mod fields;
mod store;

#[cfg(feature = "dashboard")]
mod dashboard;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use larder_api::{InventoryClient, ItemId, ItemUpdate, NewItem};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::commands::AppContext;
use crate::config::{load_config, resolve_api_url, resolve_token_path};
use crate::store::{FileTokenStore, default_data_dir};

#[derive(Parser)]
#[command(name = "lrd")]
#[command(about = "Larder inventory dashboard", long_about = None)]
struct Cli {
    /// Inventory API origin
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// File holding the bearer token
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the bearer token
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Remove the stored token
    Logout,

    /// Show who the stored token belongs to
    Whoami {
        /// Also print the raw token
        #[arg(long)]
        show_token: bool,
    },

    /// List inventory items
    List {
        /// Only items below the low-stock threshold
        #[arg(long)]
        low_stock: bool,
    },

    /// Add an item
    Add {
        #[arg(long, value_parser = fields::parse_name)]
        name: String,

        #[arg(long, value_parser = fields::parse_quantity)]
        quantity: u32,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long, value_parser = fields::parse_price)]
        price: Option<Decimal>,
    },

    /// Change fields of an item
    Edit {
        id: ItemId,

        #[arg(long, value_parser = fields::parse_name)]
        name: Option<String>,

        #[arg(long, value_parser = fields::parse_quantity)]
        quantity: Option<u32>,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long, value_parser = fields::parse_price)]
        price: Option<Decimal>,
    },

    /// Delete an item
    Remove { id: ItemId },

    /// Take stock out of an item
    Withdraw {
        id: ItemId,

        /// Amount to withdraw; must not exceed the quantity on hand
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    #[cfg(feature = "dashboard")]
    /// Start the interactive dashboard
    Dashboard,
}

impl Command {
    fn is_interactive(&self) -> bool {
        #[cfg(feature = "dashboard")]
        let interactive = matches!(self, Command::Dashboard);
        #[cfg(not(feature = "dashboard"))]
        let interactive = false;
        interactive
    }
}

fn init_tracing(interactive: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("LARDER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    if interactive {
        // The terminal belongs to the dashboard, so logs go to a file.
        let dir = default_data_dir();
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("lrd.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.command.is_interactive())?;

    let config = load_config();
    let api_url = resolve_api_url(cli.api_url, &config);
    let token_path = resolve_token_path(cli.token_file, &config);
    tracing::debug!(%api_url, token_path = %token_path.display(), "Resolved configuration");

    let ctx = AppContext::new(
        InventoryClient::with_base_url(api_url),
        FileTokenStore::new(token_path),
    );

    match cli.command {
        Command::Login { username, password } => {
            commands::login(&ctx, username, password).await?;
        }
        Command::Logout => commands::logout(&ctx)?,
        Command::Whoami { show_token } => commands::whoami(&ctx, show_token)?,
        Command::List { low_stock } => commands::list(&ctx, low_stock).await?,
        Command::Add {
            name,
            quantity,
            unit,
            price,
        } => {
            let item = NewItem {
                item_name: name,
                quantity,
                unit: unit.as_deref().and_then(fields::optional_text),
                price,
            };
            commands::add(&ctx, item).await?;
        }
        Command::Edit {
            id,
            name,
            quantity,
            unit,
            price,
        } => {
            let update = ItemUpdate {
                item_name: name,
                quantity,
                unit,
                price,
            };
            commands::edit(&ctx, id, update).await?;
        }
        Command::Remove { id } => commands::remove(&ctx, id).await?,
        Command::Withdraw { id, amount } => commands::withdraw(&ctx, id, amount).await?,
        #[cfg(feature = "dashboard")]
        Command::Dashboard => {
            dashboard::run(ctx).await?;
        }
    }

    Ok(())
}
