//! Carrier profile: the attributes pricing reads about a carrier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Audit;

/// A carrier's vehicle and rate details.
///
/// Read-only input to pricing; the booking engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierProfile {
    pub id: Uuid,
    pub name: String,
    pub vehicle_type: Option<String>,
    /// Declared vehicle capacity in kilograms.
    pub vehicle_capacity_kg: Option<Decimal>,
    /// Preferred rate per kilometre.
    pub base_rate_per_km: Option<Decimal>,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub audit: Audit,
}

impl CarrierProfile {
    /// A profile with only a name; every pricing input unset.
    pub fn named(name: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name: name.into(),
            vehicle_type: None,
            vehicle_capacity_kg: None,
            base_rate_per_km: None,
            current_latitude: None,
            current_longitude: None,
            audit: Audit::created_by(id),
        }
    }
}
