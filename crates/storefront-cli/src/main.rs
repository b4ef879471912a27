// SPDX-License-Identifier: AGPL-3.0
// Storefront CLI - Main entry point
//
// Drives the device-local cart from the command line.

mod commands;
mod state;

use clap::{Parser, Subcommand};
use state::AppState;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "storefront", version, about = "Manage the local storefront cart")]
struct Cli {
    /// Settings file to use instead of the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cart and its totals
    Show,
    /// Add a product to the cart
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Unit price, e.g. 9.99
        #[arg(long)]
        price: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a line
    Remove { id: String },
    /// Add one unit to a line
    Inc { id: String },
    /// Take one unit from a line
    Dec { id: String },
    /// Set the quantity of a line
    Set { id: String, qty: u32 },
    /// Empty the cart
    Clear,
    /// Print the payment and order payloads for the cart
    CheckoutPreview,
    /// Print current settings
    Settings,
    /// Turn tax on or off
    SetTax {
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
        /// Rate as a fraction, e.g. 0.07
        #[arg(long)]
        rate: Option<String>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("storefront_cli=info".parse().unwrap())
                .add_directive("storefront_core=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Starting storefront v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let app_state = match AppState::new(cli.config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to initialize application state: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Show => commands::show_cart(&app_state),
        Command::Add {
            id,
            name,
            price,
            qty,
            image,
        } => commands::add_item(&app_state, id, name, &price, qty, image),
        Command::Remove { id } => commands::remove_item(&app_state, &id),
        Command::Inc { id } => commands::increment(&app_state, &id),
        Command::Dec { id } => commands::decrement(&app_state, &id),
        Command::Set { id, qty } => commands::set_quantity(&app_state, &id, qty),
        Command::Clear => commands::clear_cart(&app_state),
        Command::CheckoutPreview => commands::checkout_preview(&app_state),
        Command::Settings => commands::get_settings(&app_state),
        Command::SetTax { enabled, rate } => {
            commands::set_tax(&app_state, enabled, rate.as_deref())
        }
    };

    match result.and_then(|value| serde_json::to_string_pretty(&value).map_err(|e| e.to_string())) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
