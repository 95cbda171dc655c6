//! Booking commands: book a load, list your bookings.

use uuid::Uuid;

use crate::{
    booking::{self, BookingRequest},
    model::{Load, PricingAlgorithm},
    storage::Storage,
};

use super::format::{format_price, short_id};

pub(super) fn cmd_book(
    storage: &Storage,
    carrier_id: Uuid,
    load: &Load,
    algorithm: PricingAlgorithm,
) -> Result<(), String> {
    let request = BookingRequest {
        load_id: load.id,
        carrier_id,
        algorithm,
    };

    let confirmation =
        booking::book(storage, &request).map_err(|e| e.user_message().to_string())?;

    println!("{}", confirmation.message());
    eprintln!("Booking {}", short_id(confirmation.booking.id));
    Ok(())
}

pub(super) fn cmd_bookings(storage: &Storage, carrier_id: Uuid) -> Result<(), String> {
    let summaries = storage
        .list_bookings_by_carrier(carrier_id)
        .map_err(|e| format!("failed to list bookings: {e}"))?;

    if summaries.is_empty() {
        println!("No bookings");
        return Ok(());
    }

    for s in &summaries {
        let b = &s.booking;
        println!(
            "{}  [{}]  {}  {}  {}  load {}  {}",
            short_id(b.id),
            b.status,
            b.booked_at.strftime("%Y-%m-%d %H:%M"),
            format_price(Some(b.price)),
            b.algorithm.tag(),
            short_id(b.load_id),
            s.load_name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        model::LoadStatus,
        storage::tests::{sample_carrier, sample_load, test_storage},
    };

    #[test]
    fn booking_twice_reports_already_booked() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        let carrier = sample_carrier();
        storage.create_load(&load).unwrap();
        storage.create_carrier(&carrier).unwrap();

        cmd_book(&storage, carrier.id, &load, PricingAlgorithm::Distance).unwrap();
        let err = cmd_book(&storage, carrier.id, &load, PricingAlgorithm::Dynamic).unwrap_err();

        assert_eq!(err, "This load is no longer available.");
        assert_eq!(storage.get_load(load.id).unwrap().status, LoadStatus::Booked);
        assert_eq!(storage.list_bookings_by_carrier(carrier.id).unwrap().len(), 1);
    }

    #[test]
    fn unregistered_carrier_told_to_register() {
        let (_dir, storage) = test_storage();
        let load = sample_load();
        storage.create_load(&load).unwrap();

        let err = cmd_book(&storage, Uuid::new_v4(), &load, PricingAlgorithm::Dynamic).unwrap_err();
        assert!(err.contains("Register a carrier profile"));
    }
}
