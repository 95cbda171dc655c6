//! Distance pricing: haversine kilometres at the carrier's per-km rate.

use rust_decimal::{Decimal, prelude::FromPrimitive};
use rust_decimal_macros::dec;

use crate::{
    geo,
    model::{CarrierProfile, Load, PricingAlgorithm},
};

use super::{MarketContext, Quote, Strategy, round_money};

/// Rate used when the carrier has not set one.
pub const DEFAULT_RATE_PER_KM: Decimal = dec!(90);
const WEIGHT_RATE: Decimal = dec!(3);

/// `distance·rate + weight·3`.
///
/// Undefined unless both pickup and destination carry coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Distance;

impl Strategy for Distance {
    fn algorithm(&self) -> PricingAlgorithm {
        PricingAlgorithm::Distance
    }

    fn price(
        &self,
        load: &Load,
        carrier: &CarrierProfile,
        _market: &MarketContext,
    ) -> Option<Quote> {
        let km = geo::haversine_km(
            load.pickup.latitude,
            load.pickup.longitude,
            load.destination.latitude,
            load.destination.longitude,
        )?;
        let distance = Decimal::from_f64(km)?;

        let rate = carrier
            .base_rate_per_km
            .filter(|r| *r > Decimal::ZERO)
            .unwrap_or(DEFAULT_RATE_PER_KM);

        let price = distance
            .checked_mul(rate)?
            .checked_add(load.weight_kg.checked_mul(WEIGHT_RATE)?)?;
        Some(Quote {
            price: round_money(price),
            distance_km: Some(km),
        })
    }
}
