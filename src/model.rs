//! Core data model for freight.
//!
//! Loads posted by consignors, carrier profiles, and the bookings that
//! join them at a price chosen by one of the pricing algorithms.

mod algorithm;
mod booking;
mod carrier;
mod load;

pub use algorithm::PricingAlgorithm;
pub use booking::{Booking, BookingStatus};
pub use carrier::CarrierProfile;
pub use load::{Address, Audit, Load, LoadStatus};
