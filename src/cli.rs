//! CLI interface for freight.
//!
//! Each subcommand is non-interactive: arguments in, plain text out.
//! Commands split by who runs them:
//!
//! - `freight load post|mine|cancel|edit`: consignors managing their loads.
//! - `freight carrier …`, `freight load available`, `freight book`,
//!   `freight bookings`: carriers finding and booking loads.
//!
//! The acting party comes from `--as`, `FREIGHT_IDENTITY`, or the config
//! file. Load arguments take a full UUID or an unambiguous prefix.

mod booking;
mod carrier;
mod format;
mod load;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::{
    config::Config,
    identity::resolve_identity,
    model::{Load, PricingAlgorithm},
    storage::Storage,
};

use carrier::CarrierCommand;
use load::LoadCommand;

/// Freight: post loads, quote them, book them.
#[derive(Debug, Parser)]
#[command(name = "freight", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Acting party: a consignor or carrier UUID.
    #[arg(long = "as", global = true)]
    identity: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: booking a load
  1. freight carrier register --name "Himalayan Haulage" --capacity-kg 8000
     → prints a carrier ID; export FREIGHT_IDENTITY=<that id>
  2. freight load available
     → pending loads with dynamic, distance, and weight-fit quotes
  3. freight book 3fa --algorithm distance
  4. freight bookings

Posting a load (as a consignor):
  freight --as <consignor-id> load post --name "Electronics" --description "Boxed TVs" \
      --pickup "Kathmandu" --pickup-lat 27.7172 --pickup-lon 85.3240 \
      --destination "Pokhara" --destination-lat 28.2096 --destination-lon 83.9856 \
      --weight-kg 500 --date 2025-03-10"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage your carrier profile.
    Carrier {
        #[command(subcommand)]
        command: CarrierCommand,
    },

    /// Post, list, inspect, and cancel loads.
    Load {
        #[command(subcommand)]
        command: LoadCommand,
    },

    /// Book a pending load at the selected algorithm's price.
    Book {
        /// Load ID: full UUID or unambiguous prefix.
        load: String,

        /// Pricing algorithm to book with: dynamic, distance, or weight.
        #[arg(long, default_value = "dynamic")]
        algorithm: PricingAlgorithm,
    },

    /// List your bookings, newest first.
    Bookings,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();
    let explicit = cli.identity.as_deref();
    let acting = || resolve_identity(explicit, config);

    match cli.command {
        Command::Carrier { command } => carrier::run(storage, command, acting),
        Command::Load { command } => load::run(storage, command, acting),
        Command::Book { load, algorithm } => {
            let carrier_id = acting()?;
            let load = resolve_load(storage, &load)?;
            booking::cmd_book(storage, carrier_id, &load, algorithm)
        }
        Command::Bookings => booking::cmd_bookings(storage, acting()?),
    }
}

/// Resolve a load reference (full UUID or unambiguous prefix) to a load.
fn resolve_load(storage: &Storage, reference: &str) -> Result<Load, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .get_load(id)
            .map_err(|e| format!("load not found: {e}"));
    }

    let mut matches = storage
        .loads_with_id_prefix(reference)
        .map_err(|e| format!("failed to look up load '{reference}': {e}"))?;

    match matches.len() {
        0 => Err(format!("no load matching '{reference}'")),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(|l| format::short_id(l.id)).collect();
            Err(format!(
                "'{reference}' is ambiguous, matches {n} loads: {}",
                ids.join(", ")
            ))
        }
    }
}
