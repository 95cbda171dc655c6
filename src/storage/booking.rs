//! Booking storage: the atomic booking commit and booking lookups.

use rusqlite::{TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{Booking, BookingStatus, LoadStatus};

use super::{
    Result, Storage, StorageError, constraint_violation, is_unique_violation, parse_column,
    parse_decimal, parse_timestamp, parse_uuid, read_audit,
};

const BOOKING_COLUMNS: &str = "b.id, b.load_id, b.carrier_id, b.algorithm, b.price,
    b.distance_km, b.status, b.booked_at,
    b.created_by, b.updated_by, b.created_at, b.updated_at";

/// A carrier's booking alongside the name of the load it covers.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking: Booking,
    pub load_name: String,
}

impl Storage {
    /// Writes `booking` and moves its load from `pending` to `booked` in one
    /// transaction. Both writes commit together or neither does.
    ///
    /// Fails with [`StorageError::DuplicateBooking`] when the unique key on
    /// `bookings.load_id` rejects the insert, and with
    /// [`StorageError::LoadUnavailable`] when the load is no longer pending.
    pub fn commit_booking(&self, booking: &Booking) -> Result<()> {
        if booking.price < Decimal::ZERO {
            return Err(StorageError::Invalid(format!(
                "booking {} has a negative price",
                booking.id
            )));
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(StorageError::Invalid(format!(
                "new booking {} must be confirmed",
                booking.id
            )));
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO bookings (id, load_id, carrier_id, algorithm, price, distance_km,
                                   status, booked_at, created_by, updated_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                booking.id.to_string(),
                booking.load_id.to_string(),
                booking.carrier_id.to_string(),
                booking.algorithm.tag(),
                booking.price.to_string(),
                booking.distance_km,
                booking.status.as_str(),
                booking.booked_at.to_string(),
                booking.audit.created_by.map(|u| u.to_string()),
                booking.audit.updated_by.map(|u| u.to_string()),
                booking.audit.created_at.to_string(),
                booking.audit.updated_at.to_string(),
            ],
        );
        match inserted {
            Err(e) if is_unique_violation(&e) => {
                warn!(load_id = %booking.load_id, "unique key rejected a second booking");
                return Err(StorageError::DuplicateBooking(booking.load_id));
            }
            Err(e) if constraint_violation(&e).is_some() => {
                return Err(StorageError::Invalid(format!(
                    "booking {} rejected by the store: {e}",
                    booking.id
                )));
            }
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }

        let updated = tx.execute(
            "UPDATE loads SET status = ?1, updated_by = ?2, updated_at = ?3
             WHERE id = ?4 AND status = ?5",
            params![
                LoadStatus::Booked.as_str(),
                booking.carrier_id.to_string(),
                booking.booked_at.to_string(),
                booking.load_id.to_string(),
                LoadStatus::Pending.as_str(),
            ],
        )?;
        if updated == 0 {
            // Dropping the transaction rolls back the insert.
            return Err(StorageError::LoadUnavailable(booking.load_id));
        }

        tx.commit()?;
        debug!(booking_id = %booking.id, load_id = %booking.load_id, "booking committed");
        Ok(())
    }

    /// The booking for a load, if one exists.
    pub fn booking_for_load(&self, load_id: Uuid) -> Result<Option<Booking>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.load_id = ?1"
        ))?;
        let mut rows = stmt.query([load_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_booking(row)?)),
            None => Ok(None),
        }
    }

    /// Lists a carrier's bookings with their load names, newest first.
    pub fn list_bookings_by_carrier(&self, carrier_id: Uuid) -> Result<Vec<BookingSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS}, l.name
             FROM bookings b JOIN loads l ON l.id = b.load_id
             WHERE b.carrier_id = ?1"
        ))?;
        let mut rows = stmt.query([carrier_id.to_string()])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(BookingSummary {
                booking: read_booking(row)?,
                load_name: row.get(12)?,
            });
        }
        summaries.sort_by(|a, b| b.booking.booked_at.cmp(&a.booking.booked_at));
        Ok(summaries)
    }
}

/// Decodes a row selected with [`BOOKING_COLUMNS`].
fn read_booking(row: &rusqlite::Row<'_>) -> Result<Booking> {
    let id: String = row.get(0)?;
    let load_id: String = row.get(1)?;
    let carrier_id: String = row.get(2)?;
    let algorithm: String = row.get(3)?;
    let price: String = row.get(4)?;
    let status: String = row.get(6)?;
    let booked_at: String = row.get(7)?;

    Ok(Booking {
        id: parse_uuid("booking id", &id)?,
        load_id: parse_uuid("load id", &load_id)?,
        carrier_id: parse_uuid("carrier id", &carrier_id)?,
        algorithm: parse_column("pricing algorithm", &algorithm)?,
        price: parse_decimal("price", &price)?,
        distance_km: row.get(5)?,
        status: parse_column("booking status", &status)?,
        booked_at: parse_timestamp("booked_at", &booked_at)?,
        audit: read_audit(row, 8)?,
    })
}
