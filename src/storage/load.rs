//! Load storage: post, fetch, list, edit, and move loads through their lifecycle.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::{Address, BookingStatus, Load, LoadStatus};

use super::{
    KILOGRAMS, Result, Storage, StorageError, is_primary_key_violation, parse_column, parse_date,
    parse_decimal, parse_uuid, read_audit,
};

const LOAD_COLUMNS: &str = "id, consignor_id, name, description,
    pickup_address, pickup_latitude, pickup_longitude,
    destination_address, destination_latitude, destination_longitude,
    weight_kg, scheduled_date, status,
    created_by, updated_by, created_at, updated_at";

impl Storage {
    /// Posts a new load. New loads must be pending and weigh something.
    pub fn create_load(&self, load: &Load) -> Result<()> {
        if load.status != LoadStatus::Pending {
            return Err(StorageError::Invalid(format!(
                "new load {} must be pending, not {}",
                load.id, load.status
            )));
        }
        validate_weight(load)?;

        let conn = self.connect()?;
        let inserted = conn.execute(
            &format!(
                "INSERT INTO loads ({LOAD_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
            ),
            params![
                load.id.to_string(),
                load.consignor_id.to_string(),
                &load.name,
                &load.description,
                &load.pickup.address,
                load.pickup.latitude,
                load.pickup.longitude,
                &load.destination.address,
                load.destination.latitude,
                load.destination.longitude,
                load.weight_kg.to_string(),
                load.scheduled_date.to_string(),
                load.status.as_str(),
                load.audit.created_by.map(|u| u.to_string()),
                load.audit.updated_by.map(|u| u.to_string()),
                load.audit.created_at.to_string(),
                load.audit.updated_at.to_string(),
            ],
        );
        match inserted {
            Err(e) if is_primary_key_violation(&e) => Err(StorageError::LoadAlreadyExists(load.id)),
            Err(e) => Err(e.into()),
            Ok(_) => {
                info!(load_id = %load.id, consignor_id = %load.consignor_id, "load posted");
                Ok(())
            }
        }
    }

    /// Loads a single load.
    pub fn get_load(&self, id: Uuid) -> Result<Load> {
        let conn = self.connect()?;
        find_load(&conn, id)?.ok_or(StorageError::LoadNotFound(id))
    }

    /// Loads whose id starts with `prefix`.
    ///
    /// The prefix may only hold hex digits and dashes.
    pub fn loads_with_id_prefix(&self, prefix: &str) -> Result<Vec<Load>> {
        if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(StorageError::Invalid(format!(
                "'{prefix}' is not a load id prefix"
            )));
        }
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE id LIKE ?1 || '%'"
        ))?;
        let mut rows = stmt.query([prefix.to_ascii_lowercase()])?;
        let mut loads = Vec::new();
        while let Some(row) = rows.next()? {
            loads.push(read_load(row)?);
        }
        sort_newest_first(&mut loads);
        Ok(loads)
    }

    /// Lists a consignor's loads, newest first.
    pub fn list_loads_by_consignor(&self, consignor_id: Uuid) -> Result<Vec<Load>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE consignor_id = ?1"
        ))?;
        let mut rows = stmt.query([consignor_id.to_string()])?;
        let mut loads = Vec::new();
        while let Some(row) = rows.next()? {
            loads.push(read_load(row)?);
        }
        sort_newest_first(&mut loads);
        Ok(loads)
    }

    /// Lists loads awaiting a carrier, newest first.
    pub fn list_pending_loads(&self) -> Result<Vec<Load>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE status = ?1"
        ))?;
        let mut rows = stmt.query([LoadStatus::Pending.as_str()])?;
        let mut loads = Vec::new();
        while let Some(row) = rows.next()? {
            loads.push(read_load(row)?);
        }
        sort_newest_first(&mut loads);
        Ok(loads)
    }

    /// Counts loads currently awaiting a carrier.
    ///
    /// Always a fresh query: this is the demand signal for dynamic pricing.
    pub fn count_pending_loads(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM loads WHERE status = ?1",
            [LoadStatus::Pending.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|e| StorageError::Corrupt(format!("negative count: {e}")))
    }

    /// Rewrites a load's content. Only pending loads can be edited; status
    /// and audit creation fields are left alone.
    pub fn update_load_details(&self, load: &Load, by: Uuid) -> Result<()> {
        validate_weight(load)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let status = current_status(&tx, load.id)?;
        if status != LoadStatus::Pending {
            return Err(StorageError::LoadNotEditable {
                id: load.id,
                status,
            });
        }
        tx.execute(
            "UPDATE loads
             SET name = ?1, description = ?2,
                 pickup_address = ?3, pickup_latitude = ?4, pickup_longitude = ?5,
                 destination_address = ?6, destination_latitude = ?7, destination_longitude = ?8,
                 weight_kg = ?9, scheduled_date = ?10, updated_by = ?11, updated_at = ?12
             WHERE id = ?13",
            params![
                &load.name,
                &load.description,
                &load.pickup.address,
                load.pickup.latitude,
                load.pickup.longitude,
                &load.destination.address,
                load.destination.latitude,
                load.destination.longitude,
                load.weight_kg.to_string(),
                load.scheduled_date.to_string(),
                by.to_string(),
                Timestamp::now().to_string(),
                load.id.to_string(),
            ],
        )?;
        tx.commit()?;
        debug!(load_id = %load.id, "load details updated");
        Ok(())
    }

    /// Moves a load to `to`, enforcing the forward-only lifecycle.
    ///
    /// `Booked` is only reachable through [`Storage::commit_booking`].
    /// Cancelling a booked load cancels its booking in the same transaction.
    pub fn transition_load(&self, id: Uuid, to: LoadStatus, by: Uuid) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let from = current_status(&tx, id)?;
        if to == LoadStatus::Booked || !from.can_transition_to(to) {
            return Err(StorageError::InvalidTransition { id, from, to });
        }

        let now = Timestamp::now().to_string();
        tx.execute(
            "UPDATE loads SET status = ?1, updated_by = ?2, updated_at = ?3 WHERE id = ?4",
            params![to.as_str(), by.to_string(), &now, id.to_string()],
        )?;
        if from == LoadStatus::Booked && to == LoadStatus::Cancelled {
            tx.execute(
                "UPDATE bookings SET status = ?1, updated_by = ?2, updated_at = ?3
                 WHERE load_id = ?4",
                params![
                    BookingStatus::Cancelled.as_str(),
                    by.to_string(),
                    &now,
                    id.to_string()
                ],
            )?;
        }
        tx.commit()?;
        info!(load_id = %id, %from, %to, "load status changed");
        Ok(())
    }
}

fn validate_weight(load: &Load) -> Result<()> {
    if load.weight_kg <= Decimal::ZERO {
        return Err(StorageError::Invalid(format!(
            "load {} must weigh more than 0 kg",
            load.id
        )));
    }
    KILOGRAMS.check("weight", load.weight_kg)
}

/// Reads a load by id on an existing connection or transaction.
fn find_load(conn: &Connection, id: Uuid) -> Result<Option<Load>> {
    let mut stmt = conn.prepare(&format!("SELECT {LOAD_COLUMNS} FROM loads WHERE id = ?1"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_load(row)?)),
        None => Ok(None),
    }
}

fn current_status(conn: &Connection, id: Uuid) -> Result<LoadStatus> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT status FROM loads WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let raw = raw.ok_or(StorageError::LoadNotFound(id))?;
    parse_column("load status", &raw)
}

/// Decodes a row selected with [`LOAD_COLUMNS`].
fn read_load(row: &rusqlite::Row<'_>) -> Result<Load> {
    let id: String = row.get(0)?;
    let consignor_id: String = row.get(1)?;
    let weight: String = row.get(10)?;
    let scheduled: String = row.get(11)?;
    let status: String = row.get(12)?;

    Ok(Load {
        id: parse_uuid("load id", &id)?,
        consignor_id: parse_uuid("consignor id", &consignor_id)?,
        name: row.get(2)?,
        description: row.get(3)?,
        pickup: Address {
            address: row.get(4)?,
            latitude: row.get(5)?,
            longitude: row.get(6)?,
        },
        destination: Address {
            address: row.get(7)?,
            latitude: row.get(8)?,
            longitude: row.get(9)?,
        },
        weight_kg: parse_decimal("weight", &weight)?,
        scheduled_date: parse_date("scheduled date", &scheduled)?,
        status: parse_column("load status", &status)?,
        audit: read_audit(row, 13)?,
    })
}

fn sort_newest_first(loads: &mut [Load]) {
    loads.sort_by(|a, b| b.audit.created_at.cmp(&a.audit.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    use crate::storage::tests::{sample_load, test_storage};

    #[test]
    fn create_and_get_load() {
        let (_dir, storage) = test_storage();
        let load = sample_load();

        storage.create_load(&load).unwrap();
        let loaded = storage.get_load(load.id).unwrap();

        assert_eq!(loaded.id, load.id);
        assert_eq!(loaded.name, load.name);
        assert_eq!(loaded.pickup, load.pickup);
        assert_eq!(loaded.destination, load.destination);
        assert_eq!(loaded.weight_kg, dec!(500));
        assert_eq!(loaded.scheduled_date, load.scheduled_date);
        assert_eq!(loaded.status, LoadStatus::Pending);
        assert_eq!(loaded.audit, load.audit);
    }

    #[test]
    fn create_duplicate_load_fails() {
        let (_dir, storage) = test_storage();
        let load = sample_load();

        storage.create_load(&load).unwrap();
        let err = storage.create_load(&load).unwrap_err();

        assert!(matches!(err, StorageError::LoadAlreadyExists(_)));
    }

    #[test]
    fn create_non_pending_load_fails() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        load.status = LoadStatus::Booked;

        let err = storage.create_load(&load).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
    }

    #[test]
    fn create_weightless_load_fails() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        load.weight_kg = Decimal::ZERO;

        let err = storage.create_load(&load).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
    }

    #[test]
    fn create_load_with_sub_cent_weight_fails() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        load.weight_kg = dec!(12.345);

        let err = storage.create_load(&load).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
    }

    #[test]
    fn create_oversized_load_fails() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        load.weight_kg = Decimal::MAX / dec!(2);

        let err = storage.create_load(&load).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
        assert!(matches!(
            storage.get_load(load.id),
            Err(StorageError::LoadNotFound(_))
        ));
    }

    #[test]
    fn get_nonexistent_load_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.get_load(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::LoadNotFound(_)));
    }

    #[test]
    fn missing_coordinates_round_trip_as_none() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        load.pickup = Address::new("Somewhere in Kathmandu");

        storage.create_load(&load).unwrap();
        let loaded = storage.get_load(load.id).unwrap();

        assert_eq!(loaded.pickup.latitude, None);
        assert_eq!(loaded.pickup.longitude, None);
    }

    #[test]
    fn list_loads_by_consignor_newest_first() {
        let (_dir, storage) = test_storage();
        let consignor = Uuid::new_v4();

        let mut older = sample_load();
        older.consignor_id = consignor;
        older.name = "Older".into();
        older.audit.created_at = Timestamp::new(1_000_000_000, 0).unwrap();

        let mut newer = sample_load();
        newer.consignor_id = consignor;
        newer.name = "Newer".into();
        newer.audit.created_at = Timestamp::new(2_000_000_000, 0).unwrap();

        let someone_else = sample_load();

        storage.create_load(&older).unwrap();
        storage.create_load(&someone_else).unwrap();
        storage.create_load(&newer).unwrap();

        let loads = storage.list_loads_by_consignor(consignor).unwrap();
        let names: Vec<_> = loads.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Newer", "Older"]);
    }

    #[test]
    fn loads_with_id_prefix_matches_start_of_id() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        storage.create_load(&load).unwrap();
        storage.create_load(&sample_load()).unwrap();

        let id = load.id.to_string();
        let found = storage.loads_with_id_prefix(&id[..13]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, load.id);

        assert_eq!(storage.loads_with_id_prefix("").unwrap().len(), 2);
    }

    #[test]
    fn loads_with_id_prefix_rejects_wildcards() {
        let (_dir, storage) = test_storage();
        let err = storage.loads_with_id_prefix("%").unwrap_err();

        assert!(matches!(err, StorageError::Invalid(_)));
    }

    #[test]
    fn pending_list_and_count_exclude_other_statuses() {
        let (_dir, storage) = test_storage();
        let open = sample_load();
        let cancelled = sample_load();
        storage.create_load(&open).unwrap();
        storage.create_load(&cancelled).unwrap();
        storage
            .transition_load(cancelled.id, LoadStatus::Cancelled, cancelled.consignor_id)
            .unwrap();

        let pending = storage.list_pending_loads().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, open.id);
        assert_eq!(storage.count_pending_loads().unwrap(), 1);
    }

    #[test]
    fn count_pending_loads_empty() {
        let (_dir, storage) = test_storage();
        assert_eq!(storage.count_pending_loads().unwrap(), 0);
    }

    #[test]
    fn update_pending_load_details() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        storage.create_load(&load).unwrap();

        load.name = "Refrigerators".into();
        load.weight_kg = dec!(750.50);
        storage.update_load_details(&load, load.consignor_id).unwrap();

        let loaded = storage.get_load(load.id).unwrap();
        assert_eq!(loaded.name, "Refrigerators");
        assert_eq!(loaded.weight_kg, dec!(750.50));
        assert_eq!(loaded.audit.created_at, load.audit.created_at);
    }

    #[test]
    fn update_to_oversized_weight_fails() {
        let (_dir, storage) = test_storage();
        let mut load = sample_load();
        storage.create_load(&load).unwrap();

        load.weight_kg = dec!(100000000);
        let err = storage
            .update_load_details(&load, load.consignor_id)
            .unwrap_err();

        assert!(matches!(err, StorageError::Invalid(_)));
        assert_eq!(storage.get_load(load.id).unwrap().weight_kg, dec!(500));
    }

    #[test]
    fn update_cancelled_load_fails() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        storage.create_load(&load).unwrap();
        storage
            .transition_load(load.id, LoadStatus::Cancelled, load.consignor_id)
            .unwrap();

        let err = storage
            .update_load_details(&load, load.consignor_id)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::LoadNotEditable {
                status: LoadStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn update_nonexistent_load_fails() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        let err = storage
            .update_load_details(&load, load.consignor_id)
            .unwrap_err();

        assert!(matches!(err, StorageError::LoadNotFound(_)));
    }

    #[test]
    fn transition_to_booked_is_reserved_for_bookings() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        storage.create_load(&load).unwrap();

        let err = storage
            .transition_load(load.id, LoadStatus::Booked, load.consignor_id)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }));
        assert_eq!(storage.get_load(load.id).unwrap().status, LoadStatus::Pending);
    }

    #[test]
    fn transition_cannot_skip_or_reverse() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        storage.create_load(&load).unwrap();

        let err = storage
            .transition_load(load.id, LoadStatus::InTransit, load.consignor_id)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidTransition {
                from: LoadStatus::Pending,
                to: LoadStatus::InTransit,
                ..
            }
        ));

        storage
            .transition_load(load.id, LoadStatus::Cancelled, load.consignor_id)
            .unwrap();
        let err = storage
            .transition_load(load.id, LoadStatus::Pending, load.consignor_id)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }));
    }

    #[test]
    fn transition_nonexistent_load_fails() {
        let (_dir, storage) = test_storage();
        let err = storage
            .transition_load(Uuid::new_v4(), LoadStatus::Cancelled, Uuid::new_v4())
            .unwrap_err();

        assert!(matches!(err, StorageError::LoadNotFound(_)));
    }
}
