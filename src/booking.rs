//! Booking engine: turn a pending load into a booked one.
//!
//! A booking request is validated against the load's current state, priced
//! with the selected strategy, and committed atomically with the load's move
//! to `booked`. The status check and the existing-booking check are both
//! made up front, but the authority is the store's unique key on the booking's
//! load reference: a request that loses a race fails at commit time with
//! [`BookingError::TransactionConflict`] instead of double-booking.

use jiff::Timestamp;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    market,
    model::{Audit, Booking, BookingStatus, LoadStatus, PricingAlgorithm},
    pricing,
    storage::{Storage, StorageError},
};

/// A carrier's request to book a load.
#[derive(Debug, Clone, Copy)]
pub struct BookingRequest {
    pub load_id: Uuid,
    pub carrier_id: Uuid,
    pub algorithm: PricingAlgorithm,
}

/// A committed booking plus what the caller needs to confirm it.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub booking: Booking,
    pub load_name: String,
}

impl Confirmation {
    /// The message shown to the carrier after a successful booking.
    pub fn message(&self) -> String {
        format!(
            "You have successfully booked the load: {} using {} for NPR {}.",
            self.load_name,
            self.booking.algorithm.label(),
            self.booking.price
        )
    }
}

/// Why a booking was not made.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("load not found: {0}")]
    NotFound(Uuid),

    #[error("carrier not found: {0}")]
    CarrierNotFound(Uuid),

    /// The load is no longer pending. Not worth retrying.
    #[error("load {id} is {status}, not pending")]
    AlreadyUnavailable { id: Uuid, status: LoadStatus },

    /// A booking already exists even though the status may say otherwise.
    #[error("load {0} already has a booking")]
    AlreadyBooked(Uuid),

    #[error("load {load_id} cannot be priced with the {algorithm} algorithm")]
    Unpriceable {
        load_id: Uuid,
        algorithm: PricingAlgorithm,
    },

    /// The commit lost to a concurrent booking of the same load.
    #[error("load {0} was booked by a concurrent request")]
    TransactionConflict(Uuid),

    /// The store could not be reached or failed mid-request. Safe to retry.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StorageError),
}

impl BookingError {
    /// Whether the same request might succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }

    /// What to tell the carrier.
    ///
    /// A lost race and an existing booking read the same to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "This load does not exist.",
            Self::CarrierNotFound(_) => "Register a carrier profile before booking loads.",
            Self::AlreadyUnavailable { .. } => "This load is no longer available.",
            Self::AlreadyBooked(_) | Self::TransactionConflict(_) => {
                "This load has already been booked."
            }
            Self::Unpriceable { .. } => "Unable to calculate price for the selected algorithm.",
            Self::StorageFailure(_) => "An error occurred while booking. Please try again.",
        }
    }
}

fn storage_failure(err: StorageError) -> BookingError {
    error!(error = %err, "booking storage failure");
    BookingError::StorageFailure(err)
}

/// Book a pending load for a carrier at the selected strategy's price.
///
/// Only the selected strategy is evaluated, against a pending-load count
/// taken fresh for this request.
pub fn book(storage: &Storage, request: &BookingRequest) -> Result<Confirmation, BookingError> {
    let result = try_book(storage, request);
    if let Err(err) = &result
        && !err.is_retryable()
    {
        warn!(
            load_id = %request.load_id,
            carrier_id = %request.carrier_id,
            algorithm = %request.algorithm,
            error = %err,
            "booking rejected"
        );
    }
    result
}

fn try_book(storage: &Storage, request: &BookingRequest) -> Result<Confirmation, BookingError> {
    let load = match storage.get_load(request.load_id) {
        Ok(load) => load,
        Err(StorageError::LoadNotFound(id)) => return Err(BookingError::NotFound(id)),
        Err(e) => return Err(storage_failure(e)),
    };

    if load.status != LoadStatus::Pending {
        return Err(BookingError::AlreadyUnavailable {
            id: load.id,
            status: load.status,
        });
    }

    // Status is a cache of the booking's existence; check the booking itself.
    if storage
        .booking_for_load(load.id)
        .map_err(storage_failure)?
        .is_some()
    {
        return Err(BookingError::AlreadyBooked(load.id));
    }

    let carrier = match storage.get_carrier(request.carrier_id) {
        Ok(carrier) => carrier,
        Err(StorageError::CarrierNotFound(id)) => return Err(BookingError::CarrierNotFound(id)),
        Err(e) => return Err(storage_failure(e)),
    };

    let market = market::current(storage).map_err(storage_failure)?;
    let quote = pricing::strategy(request.algorithm)
        .price(&load, &carrier, &market)
        .ok_or(BookingError::Unpriceable {
            load_id: load.id,
            algorithm: request.algorithm,
        })?;

    let now = Timestamp::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        load_id: load.id,
        carrier_id: carrier.id,
        algorithm: request.algorithm,
        price: quote.price,
        distance_km: quote.distance_km,
        status: BookingStatus::Confirmed,
        booked_at: now,
        audit: Audit {
            created_by: Some(carrier.id),
            updated_by: Some(carrier.id),
            created_at: now,
            updated_at: now,
        },
    };

    match storage.commit_booking(&booking) {
        Ok(()) => {}
        Err(StorageError::DuplicateBooking(id) | StorageError::LoadUnavailable(id)) => {
            return Err(BookingError::TransactionConflict(id));
        }
        Err(e) => return Err(storage_failure(e)),
    }

    info!(
        booking_id = %booking.id,
        load_id = %booking.load_id,
        carrier_id = %booking.carrier_id,
        algorithm = %booking.algorithm,
        price = %booking.price,
        active_loads = market.active_loads,
        "load booked"
    );

    Ok(Confirmation {
        booking,
        load_name: load.name,
    })
}
