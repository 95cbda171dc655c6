//! Booking types: the committed carrier-to-load assignment.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Audit, PricingAlgorithm};

/// A carrier's booking of a load at a fixed price.
///
/// At most one booking ever exists per load; storage enforces this with a
/// unique key on `load_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub load_id: Uuid,
    pub carrier_id: Uuid,
    pub algorithm: PricingAlgorithm,
    /// Two decimal places, never negative.
    pub price: Decimal,
    /// Set only when the distance strategy priced the booking.
    pub distance_km: Option<f64>,
    pub status: BookingStatus,
    pub booked_at: Timestamp,
    pub audit: Audit,
}

/// Where a booking stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// The storage tag for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}
