//! Leure Luxe CLI - database setup and checkout tooling.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table used for carts and wishlists
//! ll-cli migrate
//!
//! # Show the Stripe session an order would produce
//! ll-cli checkout preview --file order.yaml
//! ll-cli checkout preview --file order.yaml --format form
//!
//! # Print a fresh guest id
//! ll-cli guest-id
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use leureluxe_core::checkout::SessionSettings;
use leureluxe_core::image::ImageUrlBuilder;
use leureluxe_core::{CurrencyCode, UserId};

mod commands;

use commands::checkout::PreviewFormat;

#[derive(Parser)]
#[command(name = "ll-cli")]
#[command(author, version, about = "Leure Luxe CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session table
    Migrate,
    /// Checkout tooling
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Print a freshly generated guest id
    GuestId,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Print the session request for an order file without calling Stripe
    Preview {
        /// YAML order file
        #[arg(short, long)]
        file: PathBuf,

        /// Storefront base URL (default: `STOREFRONT_BASE_URL` or <http://localhost:3000>)
        #[arg(long)]
        base_url: Option<String>,

        /// Currency code
        #[arg(long, default_value = "php")]
        currency: CurrencyCode,

        /// Comma-separated shipping countries
        #[arg(long, default_value = "PH")]
        countries: String,

        /// Sanity project for image URLs (default: `SANITY_PROJECT_ID`)
        #[arg(long)]
        project_id: Option<String>,

        /// Sanity dataset for image URLs
        #[arg(long, default_value = "production")]
        dataset: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = PreviewFormat::Json)]
        format: PreviewFormat,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Checkout { action } => match action {
            CheckoutAction::Preview {
                file,
                base_url,
                currency,
                countries,
                project_id,
                dataset,
                format,
            } => {
                dotenvy::dotenv().ok();
                let settings = SessionSettings {
                    base_url: base_url
                        .or_else(|| std::env::var("STOREFRONT_BASE_URL").ok())
                        .unwrap_or_else(|| "http://localhost:3000".to_string()),
                    currency,
                    shipping_countries: countries
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_uppercase)
                        .collect(),
                    images: ImageUrlBuilder::new(
                        project_id
                            .or_else(|| std::env::var("SANITY_PROJECT_ID").ok())
                            .unwrap_or_default(),
                        dataset,
                    ),
                };
                if !settings.images.is_configured() {
                    tracing::warn!(
                        "No Sanity project (--project-id or SANITY_PROJECT_ID); line items will have no images"
                    );
                }
                commands::checkout::run(&file, &settings, format).await?;
            }
        },
        Commands::GuestId => {
            #[allow(clippy::print_stdout)]
            {
                println!("{}", UserId::guest());
            }
        }
    }
    Ok(())
}
