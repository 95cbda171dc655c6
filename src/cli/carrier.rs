//! Carrier profile commands: register, show, update.

use clap::{Args, Subcommand};
use jiff::Timestamp;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{model::CarrierProfile, storage::Storage};

use super::format::short_id;

#[derive(Debug, Subcommand)]
pub enum CarrierCommand {
    /// Register a carrier profile. Prints the carrier ID.
    Register {
        /// Company or driver name.
        #[arg(long)]
        name: String,

        #[command(flatten)]
        details: CarrierDetails,
    },

    /// Show your carrier profile.
    Show,

    /// Change your carrier profile. Omitted fields are left as they are.
    Update {
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        details: CarrierDetails,
    },
}

/// Pricing inputs a carrier may declare.
#[derive(Debug, Args)]
pub struct CarrierDetails {
    /// e.g. "Tata 1613".
    #[arg(long)]
    vehicle_type: Option<String>,

    /// Vehicle capacity in kilograms.
    #[arg(long)]
    capacity_kg: Option<Decimal>,

    /// Preferred rate per kilometre, in NPR.
    #[arg(long)]
    rate_per_km: Option<Decimal>,

    /// Current latitude.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Current longitude.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

impl CarrierDetails {
    /// Overwrite the fields that were given.
    fn apply(self, carrier: &mut CarrierProfile) {
        if let Some(vehicle_type) = self.vehicle_type {
            carrier.vehicle_type = Some(vehicle_type);
        }
        if let Some(capacity) = self.capacity_kg {
            carrier.vehicle_capacity_kg = Some(capacity);
        }
        if let Some(rate) = self.rate_per_km {
            carrier.base_rate_per_km = Some(rate);
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            carrier.current_latitude = Some(lat);
            carrier.current_longitude = Some(lon);
        }
    }
}

pub(super) fn run(
    storage: &Storage,
    command: CarrierCommand,
    acting: impl Fn() -> Result<Uuid, String>,
) -> Result<(), String> {
    match command {
        CarrierCommand::Register { name, details } => cmd_register(storage, name, details),
        CarrierCommand::Show => cmd_show(storage, acting()?),
        CarrierCommand::Update { name, details } => {
            cmd_update(storage, acting()?, name, details)
        }
    }
}

fn cmd_register(storage: &Storage, name: String, details: CarrierDetails) -> Result<(), String> {
    let mut carrier = CarrierProfile::named(name);
    details.apply(&mut carrier);

    storage
        .create_carrier(&carrier)
        .map_err(|e| format!("failed to register carrier: {e}"))?;

    println!("{}", carrier.id);
    Ok(())
}

fn cmd_show(storage: &Storage, carrier_id: Uuid) -> Result<(), String> {
    let carrier = storage
        .get_carrier(carrier_id)
        .map_err(|e| format!("failed to load carrier profile: {e}"))?;

    let unset = || "-".to_string();
    println!("{}  {}", short_id(carrier.id), carrier.name);
    println!(
        "  vehicle:   {}",
        carrier.vehicle_type.clone().unwrap_or_else(unset)
    );
    println!(
        "  capacity:  {}",
        carrier
            .vehicle_capacity_kg
            .map_or_else(unset, |c| format!("{c} kg"))
    );
    println!(
        "  rate:      {}",
        carrier
            .base_rate_per_km
            .map_or_else(unset, |r| format!("NPR {r}/km"))
    );
    if let (Some(lat), Some(lon)) = (carrier.current_latitude, carrier.current_longitude) {
        println!("  position:  {lat:.4}, {lon:.4}");
    }
    Ok(())
}

fn cmd_update(
    storage: &Storage,
    carrier_id: Uuid,
    name: Option<String>,
    details: CarrierDetails,
) -> Result<(), String> {
    let mut carrier = storage
        .get_carrier(carrier_id)
        .map_err(|e| format!("failed to load carrier profile: {e}"))?;

    if let Some(name) = name {
        carrier.name = name;
    }
    details.apply(&mut carrier);
    carrier.audit.updated_by = Some(carrier_id);
    carrier.audit.updated_at = Timestamp::now();

    storage
        .update_carrier(&carrier)
        .map_err(|e| format!("failed to update carrier profile: {e}"))?;

    eprintln!("Carrier {} updated", short_id(carrier.id));
    Ok(())
}
