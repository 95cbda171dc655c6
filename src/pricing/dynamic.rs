//! Dynamic pricing: base fee plus weight, scaled by demand and urgency.

use jiff::civil::Date;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{CarrierProfile, Load, PricingAlgorithm};

use super::{MarketContext, Quote, Strategy};

/// Flat booking support fee.
const BASE_FEE: Decimal = dec!(200);
/// Currency units per kilogram.
const WEIGHT_RATE: Decimal = dec!(5);
/// Each pending load adds 1/20 to the surge...
const SURGE_DIVISOR: Decimal = dec!(20);
/// ...up to +50%.
const SURGE_CAP: Decimal = dec!(0.5);

/// `(200 + weight·5) · demand_surge · urgency_factor`.
///
/// Defined for every load whose arithmetic fits in a `Decimal`; weight and
/// scheduled date are mandatory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dynamic;

impl Strategy for Dynamic {
    fn algorithm(&self) -> PricingAlgorithm {
        PricingAlgorithm::Dynamic
    }

    fn price(
        &self,
        load: &Load,
        _carrier: &CarrierProfile,
        market: &MarketContext,
    ) -> Option<Quote> {
        let base = load.weight_kg.checked_mul(WEIGHT_RATE)?.checked_add(BASE_FEE)?;
        let urgency = urgency_factor(days_until(market.today, load.scheduled_date));
        let price = base
            .checked_mul(demand_surge(market.active_loads))?
            .checked_mul(urgency)?;
        Some(Quote::priced(price))
    }
}

/// `1 + min(active / 20, 0.5)`.
pub fn demand_surge(active_loads: u64) -> Decimal {
    Decimal::ONE + (Decimal::from(active_loads) / SURGE_DIVISOR).min(SURGE_CAP)
}

/// 1.3 within a day (past dates included), 1.15 within three, else 1.
pub fn urgency_factor(days_until: i64) -> Decimal {
    match days_until {
        ..=1 => dec!(1.3),
        2..=3 => dec!(1.15),
        _ => Decimal::ONE,
    }
}

/// Whole days from `today` until `scheduled`; negative when it has passed.
fn days_until(today: Date, scheduled: Date) -> i64 {
    today
        .until(scheduled)
        .map_or(0, |span| i64::from(span.get_days()))
}
