//! Freight load booking: price posted loads three ways and book each one
//! to at most one carrier.

pub mod booking;
pub mod cli;
pub mod config;
pub mod geo;
pub mod identity;
pub mod market;
pub mod model;
pub mod pricing;
pub mod storage;
