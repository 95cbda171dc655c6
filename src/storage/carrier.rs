//! Carrier storage: register, fetch, and update carrier profiles.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::model::CarrierProfile;

use super::{
    KILOGRAMS, RATE_PER_KM, Result, Storage, StorageError, is_primary_key_violation,
    parse_opt_decimal, parse_uuid, read_audit,
};

const CARRIER_COLUMNS: &str = "id, name, vehicle_type, vehicle_capacity_kg, base_rate_per_km,
    current_latitude, current_longitude,
    created_by, updated_by, created_at, updated_at";

impl Storage {
    /// Registers a carrier profile.
    pub fn create_carrier(&self, carrier: &CarrierProfile) -> Result<()> {
        validate(carrier)?;
        let conn = self.connect()?;
        let inserted = conn.execute(
            &format!(
                "INSERT INTO carriers ({CARRIER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                carrier.id.to_string(),
                &carrier.name,
                &carrier.vehicle_type,
                carrier.vehicle_capacity_kg.map(|d| d.to_string()),
                carrier.base_rate_per_km.map(|d| d.to_string()),
                carrier.current_latitude,
                carrier.current_longitude,
                carrier.audit.created_by.map(|u| u.to_string()),
                carrier.audit.updated_by.map(|u| u.to_string()),
                carrier.audit.created_at.to_string(),
                carrier.audit.updated_at.to_string(),
            ],
        );
        match inserted {
            Err(e) if is_primary_key_violation(&e) => {
                Err(StorageError::CarrierAlreadyExists(carrier.id))
            }
            Err(e) => Err(e.into()),
            Ok(_) => {
                info!(carrier_id = %carrier.id, "carrier registered");
                Ok(())
            }
        }
    }

    /// Loads a carrier profile.
    pub fn get_carrier(&self, id: Uuid) -> Result<CarrierProfile> {
        let conn = self.connect()?;
        find_carrier(&conn, id)?.ok_or(StorageError::CarrierNotFound(id))
    }

    /// Rewrites a carrier's profile.
    pub fn update_carrier(&self, carrier: &CarrierProfile) -> Result<()> {
        validate(carrier)?;
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE carriers
             SET name = ?1, vehicle_type = ?2, vehicle_capacity_kg = ?3, base_rate_per_km = ?4,
                 current_latitude = ?5, current_longitude = ?6, updated_by = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                &carrier.name,
                &carrier.vehicle_type,
                carrier.vehicle_capacity_kg.map(|d| d.to_string()),
                carrier.base_rate_per_km.map(|d| d.to_string()),
                carrier.current_latitude,
                carrier.current_longitude,
                carrier.audit.updated_by.map(|u| u.to_string()),
                carrier.audit.updated_at.to_string(),
                carrier.id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::CarrierNotFound(carrier.id));
        }
        Ok(())
    }
}

fn validate(carrier: &CarrierProfile) -> Result<()> {
    let negative = |v: Option<Decimal>| v.is_some_and(|d| d < Decimal::ZERO);
    if negative(carrier.vehicle_capacity_kg) || negative(carrier.base_rate_per_km) {
        return Err(StorageError::Invalid(format!(
            "carrier {} has a negative capacity or rate",
            carrier.id
        )));
    }
    if let Some(capacity) = carrier.vehicle_capacity_kg {
        KILOGRAMS.check("vehicle capacity", capacity)?;
    }
    if let Some(rate) = carrier.base_rate_per_km {
        RATE_PER_KM.check("rate per km", rate)?;
    }
    Ok(())
}

fn find_carrier(conn: &Connection, id: Uuid) -> Result<Option<CarrierProfile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARRIER_COLUMNS} FROM carriers WHERE id = ?1"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let id: String = row.get(0)?;
    Ok(Some(CarrierProfile {
        id: parse_uuid("carrier id", &id)?,
        name: row.get(1)?,
        vehicle_type: row.get(2)?,
        vehicle_capacity_kg: parse_opt_decimal("vehicle capacity", row.get(3)?)?,
        base_rate_per_km: parse_opt_decimal("rate per km", row.get(4)?)?,
        current_latitude: row.get(5)?,
        current_longitude: row.get(6)?,
        audit: read_audit(row, 7)?,
    }))
}
