//! Market context and read-only price quotes.
//!
//! Quotes use the same strategies and inputs as a booking, but the pending
//! count may have moved by the time the carrier commits. That divergence is
//! expected; the booking prices against its own fresh count.

use uuid::Uuid;

use crate::{
    model::Load,
    pricing::{self, MarketContext, PriceOptions},
    storage::{Result, Storage},
};

/// Market context for right now: a fresh count of pending loads.
pub fn current(storage: &Storage) -> Result<MarketContext> {
    Ok(MarketContext::new(storage.count_pending_loads()?))
}

/// Every strategy's price for one load, as seen by `carrier_id`.
pub fn quote_load(storage: &Storage, load_id: Uuid, carrier_id: Uuid) -> Result<PriceOptions> {
    let load = storage.get_load(load_id)?;
    let carrier = storage.get_carrier(carrier_id)?;
    Ok(pricing::evaluate_all(&load, &carrier, &current(storage)?))
}

/// All pending loads, newest first, each quoted for `carrier_id` against a
/// single pending count.
pub fn available_loads(storage: &Storage, carrier_id: Uuid) -> Result<Vec<(Load, PriceOptions)>> {
    let carrier = storage.get_carrier(carrier_id)?;
    let loads = storage.list_pending_loads()?;
    let market = MarketContext::new(loads.len() as u64);
    Ok(loads
        .into_iter()
        .map(|load| {
            let options = pricing::evaluate_all(&load, &carrier, &market);
            (load, options)
        })
        .collect())
}
