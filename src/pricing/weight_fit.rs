//! Weight-fit pricing: reward loads that suit the carrier's vehicle.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{CarrierProfile, Load, PricingAlgorithm};

use super::{MarketContext, Quote, Strategy};

const BASE: Decimal = dec!(150);
const WEIGHT_RATE: Decimal = dec!(6);

const UNKNOWN_CAPACITY: Decimal = dec!(1.25);
const WITHIN_CAPACITY: Decimal = dec!(0.9);
const OVER_CAPACITY: Decimal = dec!(1.4);

/// `(150 + weight·6) · multiplier`, where the multiplier depends on how the
/// load's weight compares with the carrier's declared capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightFit;

impl Strategy for WeightFit {
    fn algorithm(&self) -> PricingAlgorithm {
        PricingAlgorithm::WeightFit
    }

    fn price(
        &self,
        load: &Load,
        carrier: &CarrierProfile,
        _market: &MarketContext,
    ) -> Option<Quote> {
        let base = load.weight_kg.checked_mul(WEIGHT_RATE)?.checked_add(BASE)?;
        let multiplier = capacity_multiplier(load.weight_kg, carrier.vehicle_capacity_kg);
        Some(Quote::priced(base.checked_mul(multiplier)?))
    }
}

/// 1.25 when capacity is unknown or zero, 0.9 when the load fits, 1.4 when
/// it does not.
pub fn capacity_multiplier(weight_kg: Decimal, capacity_kg: Option<Decimal>) -> Decimal {
    match capacity_kg {
        Some(capacity) if capacity > Decimal::ZERO => {
            if weight_kg <= capacity {
                WITHIN_CAPACITY
            } else {
                OVER_CAPACITY
            }
        }
        _ => UNKNOWN_CAPACITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pricing::tests::{TODAY, sample_carrier, sample_load};

    fn price_for(weight: Decimal, capacity: Option<Decimal>) -> Decimal {
        let mut carrier = sample_carrier();
        carrier.vehicle_capacity_kg = capacity;
        WeightFit
            .price(&sample_load(weight), &carrier, &MarketContext::on(0, TODAY))
            .unwrap()
            .price
    }

    #[test]
    fn unknown_capacity_penalised_slightly() {
        // (150 + 3000) · 1.25
        assert_eq!(price_for(dec!(500), None), dec!(3937.50));
        assert_eq!(price_for(dec!(500), Some(Decimal::ZERO)), dec!(3937.50));
    }

    #[test]
    fn right_sized_load_rewarded() {
        // (150 + 3000) · 0.9
        assert_eq!(price_for(dec!(500), Some(dec!(800))), dec!(2835.00));
    }

    #[test]
    fn overflowing_weight_is_undefined() {
        let load = sample_load(Decimal::MAX / dec!(2));
        let quote = WeightFit.price(&load, &sample_carrier(), &MarketContext::on(0, TODAY));
        assert!(quote.is_none());
    }

    #[test]
    fn load_at_exact_capacity_fits() {
        assert_eq!(
            capacity_multiplier(dec!(800), Some(dec!(800))),
            WITHIN_CAPACITY
        );
    }

    #[test]
    fn price_jumps_when_weight_crosses_capacity() {
        let capacity = Some(dec!(1000));
        let at_capacity = price_for(dec!(1000), capacity);
        let just_over = price_for(dec!(1000.01), capacity);

        assert!(just_over > at_capacity);
        // (150 + 6000.06) · 1.4
        assert_eq!(just_over, dec!(8610.08));
    }
}
