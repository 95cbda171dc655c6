//! Output formatting for CLI display.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    model::{Address, Load},
    pricing::{PriceOption, PriceOptions},
};

/// The first eight hex digits of an ID, enough to pass back as a prefix.
pub(super) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(super) fn format_price(price: Option<Decimal>) -> String {
    match price {
        Some(p) => format!("NPR {p}"),
        None => "unavailable".to_string(),
    }
}

pub(super) fn format_address(address: &Address) -> String {
    match (address.latitude, address.longitude) {
        (Some(lat), Some(lon)) => format!("{} ({lat:.4}, {lon:.4})", address.address),
        _ => address.address.clone(),
    }
}

/// One line per load: short ID, status, route, weight, date, name.
pub(super) fn format_load_line(load: &Load) -> String {
    format!(
        "{}  [{}]  {} → {}  {} kg  {}  {}",
        short_id(load.id),
        load.status,
        load.pickup.address,
        load.destination.address,
        load.weight_kg,
        load.scheduled_date,
        load.name
    )
}

fn format_option(option: &PriceOption) -> String {
    let mut line = format!("{:<26}{}", option.label, format_price(option.price));
    if let Some(km) = option.distance_km {
        line.push_str(&format!("  ({km:.2} km)"));
    }
    if let Some(capacity) = option.capacity_kg {
        line.push_str(&format!("  (capacity {capacity} kg)"));
    }
    line
}

/// Indented quote lines, one per algorithm, with the tag to pass to `book`.
pub(super) fn format_quotes(options: &PriceOptions) -> Vec<String> {
    options
        .iter()
        .map(|(algorithm, option)| format!("    {:<10}{}", algorithm.tag(), format_option(option)))
        .collect()
}
