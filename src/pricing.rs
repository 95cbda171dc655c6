//! Pricing strategies: compute a price for a (load, carrier, market) tuple.
//!
//! Every strategy is pure. Missing inputs (coordinates for distance pricing,
//! say) yield `None` rather than an error, so the aggregator can always show
//! every option and the booking engine decides what "unpriceable" means.

mod distance;
mod dynamic;
mod weight_fit;

use std::collections::BTreeMap;

use jiff::{Zoned, civil::Date};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::model::{CarrierProfile, Load, PricingAlgorithm};

pub use distance::Distance;
pub use dynamic::Dynamic;
pub use weight_fit::WeightFit;

/// Market signals a strategy may read.
///
/// `today` is carried explicitly so pricing never reads the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketContext {
    /// Loads currently awaiting a carrier.
    pub active_loads: u64,
    pub today: Date,
}

impl MarketContext {
    /// Context for the current local date.
    pub fn new(active_loads: u64) -> Self {
        Self::on(active_loads, Zoned::now().date())
    }

    /// Context pinned to a given date.
    pub fn on(active_loads: u64, today: Date) -> Self {
        Self {
            active_loads,
            today,
        }
    }
}

/// A computed price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    /// Two decimal places, never negative.
    pub price: Decimal,
    /// Set by the distance strategy only; persisted on the booking.
    pub distance_km: Option<f64>,
}

impl Quote {
    fn priced(price: Decimal) -> Self {
        Self {
            price: round_money(price),
            distance_km: None,
        }
    }
}

/// A pricing strategy.
pub trait Strategy: Send + Sync {
    /// The tag this strategy is selected by.
    fn algorithm(&self) -> PricingAlgorithm;

    /// Price `load` for `carrier`, or `None` when an input is missing.
    fn price(&self, load: &Load, carrier: &CarrierProfile, market: &MarketContext)
    -> Option<Quote>;
}

/// The strategy selected by `algorithm`.
pub fn strategy(algorithm: PricingAlgorithm) -> &'static dyn Strategy {
    match algorithm {
        PricingAlgorithm::Dynamic => &Dynamic,
        PricingAlgorithm::Distance => &Distance,
        PricingAlgorithm::WeightFit => &WeightFit,
    }
}

/// One row of a price quote, for display before booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOption {
    pub label: &'static str,
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// The carrier capacity the weight-fit price was judged against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_kg: Option<Decimal>,
}

/// Every strategy's price for one load, keyed by algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceOptions(BTreeMap<PricingAlgorithm, PriceOption>);

impl PriceOptions {
    pub fn get(&self, algorithm: PricingAlgorithm) -> Option<&PriceOption> {
        self.0.get(&algorithm)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PricingAlgorithm, &PriceOption)> {
        self.0.iter().map(|(a, o)| (*a, o))
    }
}

/// Evaluate all three strategies. Never fails; a strategy that cannot price
/// the load shows up with `price: None`.
pub fn evaluate_all(load: &Load, carrier: &CarrierProfile, market: &MarketContext) -> PriceOptions {
    let options = PricingAlgorithm::ALL
        .into_iter()
        .map(|algorithm| {
            let quote = strategy(algorithm).price(load, carrier, market);
            let capacity_kg = match algorithm {
                PricingAlgorithm::WeightFit => carrier.vehicle_capacity_kg,
                _ => None,
            };
            let option = PriceOption {
                label: algorithm.label(),
                price: quote.map(|q| q.price),
                distance_km: quote.and_then(|q| q.distance_km),
                capacity_kg,
            };
            (algorithm, option)
        })
        .collect();
    PriceOptions(options)
}

/// Round to two decimal places, half away from zero. The result always
/// carries a scale of two, so `2835` displays as `2835.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use jiff::civil::date;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::model::{Address, Audit, LoadStatus};

    pub(crate) const TODAY: Date = date(2025, 3, 10);

    pub(crate) fn sample_load(weight_kg: Decimal) -> Load {
        let owner = Uuid::new_v4();
        Load {
            id: Uuid::new_v4(),
            consignor_id: owner,
            name: "Electronics from Kathmandu to Pokhara".into(),
            description: "Boxed televisions".into(),
            pickup: Address::at("Kathmandu", 27.7172, 85.3240),
            destination: Address::at("Pokhara", 28.2096, 83.9856),
            weight_kg,
            scheduled_date: TODAY,
            status: LoadStatus::Pending,
            audit: Audit::created_by(owner),
        }
    }

    pub(crate) fn sample_carrier() -> CarrierProfile {
        CarrierProfile::named("Himalayan Haulage")
    }

    #[test]
    fn evaluate_all_covers_every_algorithm() {
        let load = sample_load(dec!(500));
        let options = evaluate_all(&load, &sample_carrier(), &MarketContext::on(10, TODAY));

        let algorithms: Vec<_> = options.iter().map(|(a, _)| a).collect();
        assert_eq!(algorithms, PricingAlgorithm::ALL.to_vec());
        for (algorithm, option) in options.iter() {
            assert_eq!(option.label, algorithm.label());
            assert!(option.price.is_some());
        }
    }

    #[test]
    fn evaluate_all_is_idempotent() {
        let load = sample_load(dec!(750.25));
        let mut carrier = sample_carrier();
        carrier.vehicle_capacity_kg = Some(dec!(1000));
        let market = MarketContext::on(7, TODAY);

        assert_eq!(
            evaluate_all(&load, &carrier, &market),
            evaluate_all(&load, &carrier, &market)
        );
    }

    #[test]
    fn evaluate_all_tolerates_unpriceable_strategy() {
        let mut load = sample_load(dec!(500));
        load.pickup = Address::new("Somewhere in Kathmandu");

        let options = evaluate_all(&load, &sample_carrier(), &MarketContext::on(0, TODAY));

        let distance = options.get(PricingAlgorithm::Distance).unwrap();
        assert_eq!(distance.price, None);
        assert_eq!(distance.distance_km, None);
        assert!(options.get(PricingAlgorithm::Dynamic).unwrap().price.is_some());
        assert!(options.get(PricingAlgorithm::WeightFit).unwrap().price.is_some());
    }

    #[test]
    fn evaluate_all_survives_overflowing_weight() {
        let load = sample_load(Decimal::MAX / dec!(2));

        let options = evaluate_all(&load, &sample_carrier(), &MarketContext::on(10, TODAY));

        for (algorithm, option) in options.iter() {
            assert_eq!(option.price, None, "{algorithm} priced an overflowing load");
        }
    }

    #[test]
    fn evaluate_all_reports_distance_and_capacity() {
        let load = sample_load(dec!(500));
        let mut carrier = sample_carrier();
        carrier.vehicle_capacity_kg = Some(dec!(2000));

        let options = evaluate_all(&load, &carrier, &MarketContext::on(0, TODAY));

        let distance = options.get(PricingAlgorithm::Distance).unwrap();
        assert!(distance.distance_km.is_some());
        assert_eq!(distance.capacity_kg, None);
        let weight = options.get(PricingAlgorithm::WeightFit).unwrap();
        assert_eq!(weight.capacity_kg, Some(dec!(2000)));
    }

    #[test]
    fn aggregator_matches_selected_strategy() {
        let load = sample_load(dec!(320));
        let carrier = sample_carrier();
        let market = MarketContext::on(3, TODAY);
        let options = evaluate_all(&load, &carrier, &market);

        for algorithm in PricingAlgorithm::ALL {
            let quote = strategy(algorithm).price(&load, &carrier, &market);
            assert_eq!(options.get(algorithm).unwrap().price, quote.map(|q| q.price));
        }
    }

    #[test]
    fn quote_serializes_with_tags() {
        let load = sample_load(dec!(500));
        let options = evaluate_all(&load, &sample_carrier(), &MarketContext::on(10, TODAY));
        let json = serde_json::to_value(&options).unwrap();

        assert_eq!(json["dynamic"]["label"], "Dynamic (market/urgency)");
        assert!(json["distance"].get("distance_km").is_some());
        assert!(json["weight"].get("price").is_some());
    }

    #[test]
    fn round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
        assert_eq!(round_money(dec!(2.5)), dec!(2.50));
        assert_eq!(round_money(dec!(2835)).to_string(), "2835.00");
    }
}
