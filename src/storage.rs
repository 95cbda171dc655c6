//! Local persistence for loads, carriers, and bookings.
//!
//! Everything lives in a single `SQLite` file:
//!
//! ```text
//! ~/.freight/freight.sqlite
//!   carriers   # Carrier profiles
//!   loads      # Posted loads and their status
//!   bookings   # At most one per load (unique load_id)
//! ```
//!
//! Each operation opens its own connection, so a `Storage` can be shared by
//! any number of request threads. Exclusivity of bookings rests on the
//! `UNIQUE` constraint on `bookings.load_id` and on `BEGIN IMMEDIATE`
//! write transactions, never on in-process locks.

mod booking;
mod carrier;
mod load;

use std::{fs, io, path::PathBuf, str::FromStr, time::Duration};

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, ErrorCode, ffi};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::model::{Audit, LoadStatus};

pub use booking::BookingSummary;

/// How long a connection waits on a competing writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS carriers (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    vehicle_type        TEXT,
    vehicle_capacity_kg TEXT,
    base_rate_per_km    TEXT,
    current_latitude    REAL,
    current_longitude   REAL,
    created_by          TEXT,
    updated_by          TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS loads (
    id                    TEXT PRIMARY KEY,
    consignor_id          TEXT NOT NULL,
    name                  TEXT NOT NULL,
    description           TEXT NOT NULL,
    pickup_address        TEXT NOT NULL,
    pickup_latitude       REAL,
    pickup_longitude      REAL,
    destination_address   TEXT NOT NULL,
    destination_latitude  REAL,
    destination_longitude REAL,
    weight_kg             TEXT NOT NULL,
    scheduled_date        TEXT NOT NULL,
    status                TEXT NOT NULL CHECK (status IN
                              ('pending', 'booked', 'in_transit', 'completed', 'cancelled')),
    created_by            TEXT,
    updated_by            TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS loads_by_status ON loads (status);
CREATE INDEX IF NOT EXISTS loads_by_consignor ON loads (consignor_id);

CREATE TABLE IF NOT EXISTS bookings (
    id          TEXT PRIMARY KEY,
    load_id     TEXT NOT NULL UNIQUE REFERENCES loads (id) ON DELETE CASCADE,
    carrier_id  TEXT NOT NULL REFERENCES carriers (id),
    algorithm   TEXT NOT NULL CHECK (algorithm IN ('dynamic', 'distance', 'weight')),
    price       TEXT NOT NULL,
    distance_km REAL,
    status      TEXT NOT NULL CHECK (status IN ('confirmed', 'cancelled')),
    booked_at   TEXT NOT NULL,
    created_by  TEXT,
    updated_by  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS bookings_by_carrier ON bookings (carrier_id);
";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("load not found: {0}")]
    LoadNotFound(Uuid),

    #[error("load already exists: {0}")]
    LoadAlreadyExists(Uuid),

    #[error("carrier not found: {0}")]
    CarrierNotFound(Uuid),

    #[error("carrier already exists: {0}")]
    CarrierAlreadyExists(Uuid),

    /// The unique key on `bookings.load_id` rejected a second booking.
    #[error("load {0} already has a booking")]
    DuplicateBooking(Uuid),

    /// The load left `pending` before the booking could commit.
    #[error("load {0} is no longer pending")]
    LoadUnavailable(Uuid),

    #[error("load {id} is {status} and can no longer be edited")]
    LoadNotEditable { id: Uuid, status: LoadStatus },

    #[error("load {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: LoadStatus,
        to: LoadStatus,
    },

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// `SQLite`-backed storage for the booking core.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Opens (or creates) the database at `path` and applies the schema.
    ///
    /// Parent directories are created if they don't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { path };
        let conn = storage.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %storage.path.display(), journal_mode = %mode, "storage ready");
        Ok(storage)
    }

    /// Returns the default database path: `~/.freight/freight.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".freight").join("freight.sqlite"))
    }

    /// Opens a fresh connection with foreign keys enforced.
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }
}

/// Width of a stored decimal: total digits, and how many follow the point.
#[derive(Debug, Clone, Copy)]
struct DecimalColumn {
    max_digits: u32,
    decimal_places: u32,
}

/// Weights and capacities, up to 99 999 999.99 kg.
const KILOGRAMS: DecimalColumn = DecimalColumn {
    max_digits: 10,
    decimal_places: 2,
};

/// Per-km rates, up to 999 999.99.
const RATE_PER_KM: DecimalColumn = DecimalColumn {
    max_digits: 8,
    decimal_places: 2,
};

impl DecimalColumn {
    /// Rejects `value` if it has too many decimal places or too many
    /// integer digits.
    fn check(self, what: &str, value: Decimal) -> Result<()> {
        if value.normalize().scale() > self.decimal_places {
            return Err(StorageError::Invalid(format!(
                "{what} {value} has more than {} decimal places",
                self.decimal_places
            )));
        }
        let limit = Decimal::from(10_u64.pow(self.max_digits - self.decimal_places));
        if value.abs() >= limit {
            return Err(StorageError::Invalid(format!(
                "{what} {value} must be below {limit}"
            )));
        }
        Ok(())
    }
}

/// The extended result code of a constraint violation, if `err` is one.
fn constraint_violation(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    constraint_violation(err) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    constraint_violation(err) == Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
}

// ── Column codecs ──

fn parse_column<T>(what: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {what} {raw:?}: {e}")))
}

fn parse_uuid(what: &str, raw: &str) -> Result<Uuid> {
    parse_column(what, raw)
}

fn parse_opt_uuid(what: &str, raw: Option<String>) -> Result<Option<Uuid>> {
    raw.map(|s| parse_uuid(what, &s)).transpose()
}

fn parse_decimal(what: &str, raw: &str) -> Result<Decimal> {
    parse_column(what, raw)
}

fn parse_opt_decimal(what: &str, raw: Option<String>) -> Result<Option<Decimal>> {
    raw.map(|s| parse_decimal(what, &s)).transpose()
}

fn parse_timestamp(what: &str, raw: &str) -> Result<Timestamp> {
    parse_column(what, raw)
}

fn parse_date(what: &str, raw: &str) -> Result<Date> {
    parse_column(what, raw)
}

/// Reads the four audit columns starting at `first`.
fn read_audit(row: &rusqlite::Row<'_>, first: usize) -> Result<Audit> {
    let created_by: Option<String> = row.get(first)?;
    let updated_by: Option<String> = row.get(first + 1)?;
    let created_at: String = row.get(first + 2)?;
    let updated_at: String = row.get(first + 3)?;
    Ok(Audit {
        created_by: parse_opt_uuid("created_by", created_by)?,
        updated_by: parse_opt_uuid("updated_by", updated_by)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use jiff::civil::date;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use crate::model::{Address, CarrierProfile, Load};

    pub(crate) fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("freight.sqlite")).unwrap();
        (dir, storage)
    }

    pub(crate) fn sample_load() -> Load {
        let owner = Uuid::new_v4();
        Load {
            id: Uuid::new_v4(),
            consignor_id: owner,
            name: "Electronics from Kathmandu to Pokhara".into(),
            description: "Boxed televisions".into(),
            pickup: Address::at("New Road, Kathmandu", 27.7172, 85.3240),
            destination: Address::at("Lakeside, Pokhara", 28.2096, 83.9856),
            weight_kg: dec!(500),
            scheduled_date: date(2025, 3, 10),
            status: LoadStatus::Pending,
            audit: Audit::created_by(owner),
        }
    }

    pub(crate) fn sample_carrier() -> CarrierProfile {
        let mut carrier = CarrierProfile::named("Himalayan Haulage");
        carrier.vehicle_type = Some("Tata 1613".into());
        carrier.vehicle_capacity_kg = Some(dec!(8000));
        carrier.base_rate_per_km = Some(dec!(95.50));
        carrier
    }

    #[test]
    fn decimal_column_bounds() {
        assert!(KILOGRAMS.check("weight", dec!(99999999.99)).is_ok());
        assert!(KILOGRAMS.check("weight", dec!(12.350)).is_ok());
        assert!(KILOGRAMS.check("weight", dec!(100000000)).is_err());
        assert!(KILOGRAMS.check("weight", dec!(12.345)).is_err());
        assert!(KILOGRAMS.check("weight", Decimal::MAX).is_err());
        assert!(RATE_PER_KM.check("rate", dec!(999999.99)).is_ok());
        assert!(RATE_PER_KM.check("rate", dec!(1000000)).is_err());
    }

    #[test]
    fn new_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("freight.sqlite");

        Storage::new(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn reopening_keeps_data() {
        let (dir, storage) = test_storage();
        let load = sample_load();
        storage.create_load(&load).unwrap();

        let reopened = Storage::new(dir.path().join("freight.sqlite")).unwrap();
        assert_eq!(reopened.get_load(load.id).unwrap().name, load.name);
    }

    #[test]
    fn corrupt_column_is_reported() {
        let err = parse_uuid("load id", "not-a-uuid").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(msg) if msg.contains("load id")));
    }
}
