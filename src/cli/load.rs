//! Load commands: post, mine, available, show, cancel, edit.

use clap::Subcommand;
use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    market,
    model::{Address, Audit, Booking, Load, LoadStatus},
    pricing::PriceOptions,
    storage::{Storage, StorageError},
};

use super::{
    format::{format_address, format_load_line, format_price, format_quotes, short_id},
    resolve_load,
};

#[derive(Debug, Subcommand)]
pub enum LoadCommand {
    /// Post a new load. Prints the load ID.
    Post {
        /// e.g. "Electronics from Kathmandu to Pokhara".
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Pickup address.
        #[arg(long)]
        pickup: String,

        #[arg(long, requires = "pickup_lon", allow_negative_numbers = true)]
        pickup_lat: Option<f64>,

        #[arg(long, requires = "pickup_lat", allow_negative_numbers = true)]
        pickup_lon: Option<f64>,

        /// Destination address.
        #[arg(long)]
        destination: String,

        #[arg(long, requires = "destination_lon", allow_negative_numbers = true)]
        destination_lat: Option<f64>,

        #[arg(long, requires = "destination_lat", allow_negative_numbers = true)]
        destination_lon: Option<f64>,

        /// Weight in kilograms.
        #[arg(long)]
        weight_kg: Decimal,

        /// Scheduled pickup date (YYYY-MM-DD).
        #[arg(long)]
        date: Date,
    },

    /// List the loads you have posted, newest first.
    Mine,

    /// List pending loads with a price quote from every algorithm.
    Available {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show one load. Carriers also see their quotes.
    Show {
        /// Load ID: full UUID or unambiguous prefix.
        load: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Cancel a load you posted.
    Cancel {
        /// Load ID: full UUID or unambiguous prefix.
        load: String,
    },

    /// Edit a pending load you posted. Omitted fields are left as they are.
    Edit {
        /// Load ID: full UUID or unambiguous prefix.
        load: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        weight_kg: Option<Decimal>,

        #[arg(long)]
        date: Option<Date>,
    },
}

pub(super) fn run(
    storage: &Storage,
    command: LoadCommand,
    acting: impl Fn() -> Result<Uuid, String>,
) -> Result<(), String> {
    match command {
        LoadCommand::Post {
            name,
            description,
            pickup,
            pickup_lat,
            pickup_lon,
            destination,
            destination_lat,
            destination_lon,
            weight_kg,
            date,
        } => {
            let consignor_id = acting()?;
            let load = Load {
                id: Uuid::new_v4(),
                consignor_id,
                name,
                description,
                pickup: address(pickup, pickup_lat, pickup_lon),
                destination: address(destination, destination_lat, destination_lon),
                weight_kg,
                scheduled_date: date,
                status: LoadStatus::Pending,
                audit: Audit::created_by(consignor_id),
            };
            cmd_post(storage, &load)
        }
        LoadCommand::Mine => cmd_mine(storage, acting()?),
        LoadCommand::Available { json } => cmd_available(storage, acting()?, json),
        LoadCommand::Show { load, json } => {
            let load = resolve_load(storage, &load)?;
            cmd_show(storage, &load, acting().ok(), json)
        }
        LoadCommand::Cancel { load } => {
            let consignor_id = acting()?;
            let load = resolve_load(storage, &load)?;
            cmd_cancel(storage, &load, consignor_id)
        }
        LoadCommand::Edit {
            load,
            name,
            description,
            weight_kg,
            date,
        } => {
            let consignor_id = acting()?;
            let mut load = resolve_load(storage, &load)?;
            if let Some(name) = name {
                load.name = name;
            }
            if let Some(description) = description {
                load.description = description;
            }
            if let Some(weight_kg) = weight_kg {
                load.weight_kg = weight_kg;
            }
            if let Some(date) = date {
                load.scheduled_date = date;
            }
            cmd_edit(storage, &load, consignor_id)
        }
    }
}

fn address(address: String, latitude: Option<f64>, longitude: Option<f64>) -> Address {
    Address {
        address,
        latitude,
        longitude,
    }
}

fn ensure_owner(load: &Load, consignor_id: Uuid) -> Result<(), String> {
    if load.consignor_id != consignor_id {
        return Err(format!(
            "load {} was posted by another consignor",
            short_id(load.id)
        ));
    }
    Ok(())
}

fn cmd_post(storage: &Storage, load: &Load) -> Result<(), String> {
    storage
        .create_load(load)
        .map_err(|e| format!("failed to post load: {e}"))?;

    println!("{}", load.id);
    Ok(())
}

fn cmd_mine(storage: &Storage, consignor_id: Uuid) -> Result<(), String> {
    let loads = storage
        .list_loads_by_consignor(consignor_id)
        .map_err(|e| format!("failed to list loads: {e}"))?;

    if loads.is_empty() {
        println!("No loads posted");
        return Ok(());
    }

    for load in &loads {
        println!("{}", format_load_line(load));
    }
    Ok(())
}

#[derive(Serialize)]
struct QuotedLoad<'a> {
    load: &'a Load,
    quotes: &'a PriceOptions,
}

fn cmd_available(storage: &Storage, carrier_id: Uuid, json: bool) -> Result<(), String> {
    let board = market::available_loads(storage, carrier_id).map_err(|e| match e {
        StorageError::CarrierNotFound(_) => {
            "register a carrier profile to see available loads".to_string()
        }
        e => format!("failed to list available loads: {e}"),
    })?;

    if json {
        let entries: Vec<QuotedLoad<'_>> = board
            .iter()
            .map(|(load, quotes)| QuotedLoad { load, quotes })
            .collect();
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| format!("failed to serialize loads: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if board.is_empty() {
        println!("No loads available");
        return Ok(());
    }

    for (load, quotes) in &board {
        println!("{}", format_load_line(load));
        for line in format_quotes(quotes) {
            println!("{line}");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct LoadDetail<'a> {
    load: &'a Load,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking: Option<&'a Booking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quotes: Option<&'a PriceOptions>,
}

/// Quotes for a pending load when the viewer is a registered carrier.
fn viewer_quotes(
    storage: &Storage,
    load: &Load,
    viewer: Option<Uuid>,
) -> Result<Option<PriceOptions>, String> {
    let Some(viewer) = viewer else {
        return Ok(None);
    };
    if load.status != LoadStatus::Pending {
        return Ok(None);
    }
    match market::quote_load(storage, load.id, viewer) {
        Ok(quotes) => Ok(Some(quotes)),
        Err(StorageError::CarrierNotFound(_)) => Ok(None),
        Err(e) => Err(format!("failed to quote load: {e}")),
    }
}

fn cmd_show(
    storage: &Storage,
    load: &Load,
    viewer: Option<Uuid>,
    json: bool,
) -> Result<(), String> {
    let booking = storage
        .booking_for_load(load.id)
        .map_err(|e| format!("failed to look up booking: {e}"))?;
    let quotes = viewer_quotes(storage, load, viewer)?;

    if json {
        let detail = LoadDetail {
            load,
            booking: booking.as_ref(),
            quotes: quotes.as_ref(),
        };
        let out = serde_json::to_string_pretty(&detail)
            .map_err(|e| format!("failed to serialize load: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    println!("{}  [{}]  {}", short_id(load.id), load.status, load.name);
    println!("  {}", load.description);
    println!("  from:    {}", format_address(&load.pickup));
    println!("  to:      {}", format_address(&load.destination));
    println!("  weight:  {} kg", load.weight_kg);
    println!("  date:    {}", load.scheduled_date);
    println!("  posted:  {}", load.audit.created_at);

    match &booking {
        Some(booking) => println!(
            "  booking: {} [{}] {} via {}",
            short_id(booking.id),
            booking.status,
            format_price(Some(booking.price)),
            booking.algorithm.label()
        ),
        None if load.status.has_booking() => println!("  booking: missing"),
        None => {}
    }
    if let Some(quotes) = &quotes {
        println!("  quotes:");
        for line in format_quotes(quotes) {
            println!("{line}");
        }
    }
    Ok(())
}

fn cmd_cancel(storage: &Storage, load: &Load, consignor_id: Uuid) -> Result<(), String> {
    ensure_owner(load, consignor_id)?;

    storage
        .transition_load(load.id, LoadStatus::Cancelled, consignor_id)
        .map_err(|e| format!("failed to cancel load: {e}"))?;

    eprintln!("Load {} cancelled", short_id(load.id));
    Ok(())
}

fn cmd_edit(storage: &Storage, load: &Load, consignor_id: Uuid) -> Result<(), String> {
    ensure_owner(load, consignor_id)?;

    storage
        .update_load_details(load, consignor_id)
        .map_err(|e| format!("failed to edit load: {e}"))?;

    eprintln!("Load {} updated", short_id(load.id));
    Ok(())
}
