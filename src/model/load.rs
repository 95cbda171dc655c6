//! Load types: a shipment posted by a consignor, awaiting a carrier.

use std::{fmt, str::FromStr};

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shippable unit posted by a consignor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: Uuid,
    pub consignor_id: Uuid,
    /// e.g. "Electronics from Kathmandu to Pokhara".
    pub name: String,
    pub description: String,
    pub pickup: Address,
    pub destination: Address,
    /// Kilograms, two decimal places.
    pub weight_kg: Decimal,
    pub scheduled_date: Date,
    pub status: LoadStatus,
    pub audit: Audit,
}

/// A street address with optional coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Address {
    /// An address with no known coordinates.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            latitude: None,
            longitude: None,
        }
    }

    /// An address pinned to a latitude/longitude pair.
    pub fn at(address: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            address: address.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

/// Who touched a record and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Audit {
    /// A fresh audit trail: created and last updated by `by`, now.
    pub fn created_by(by: Uuid) -> Self {
        let now = Timestamp::now();
        Self {
            created_by: Some(by),
            updated_by: Some(by),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Where a load stands in its lifecycle.
///
/// Transitions only move forward through
/// `Pending → Booked → InTransit → Completed`. `Cancelled` is reachable
/// from `Pending` or `Booked` and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Pending,
    Booked,
    InTransit,
    Completed,
    Cancelled,
}

impl LoadStatus {
    /// Whether a load may move from `self` to `next`.
    pub fn can_transition_to(self, next: LoadStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Booked, Self::Cancelled)
                | (Self::Pending, Self::Booked)
                | (Self::Booked, Self::InTransit)
                | (Self::InTransit, Self::Completed)
        )
    }

    /// Whether a booking must exist for a load in this status.
    pub fn has_booking(self) -> bool {
        matches!(self, Self::Booked | Self::InTransit | Self::Completed)
    }

    /// The storage tag for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Booked => "booked",
            Self::InTransit => "in_transit",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "booked" => Ok(Self::Booked),
            "in_transit" => Ok(Self::InTransit),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown load status: {other}")),
        }
    }
}
