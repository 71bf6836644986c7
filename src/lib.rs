//! innkeep: availability and pricing engine for hospitality bookings.
//!
//! The crate has three layers:
//!
//! - **Pure engine** ([`engine::available_rooms`], [`engine::compose_cost`],
//!   [`engine::resolve_commission`]): deterministic functions over in-memory
//!   state, no I/O.
//! - **Reservation ledger** ([`engine::Ledger`]): the write boundary. Holds
//!   per-property-type state behind write locks and performs
//!   reserve-if-available atomically, so two racing booking attempts can
//!   never both pass the capacity check.
//! - **Record store boundary** ([`store::RecordStore`]): the external hosted
//!   store the ledger hydrates from and persists bookings through. Transient
//!   read failures are retried with backoff and then surfaced as errors,
//!   never coerced into "fully booked".

pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod store;
