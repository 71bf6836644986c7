mod availability;
mod commission;
mod conflict;
mod error;
mod mutations;
mod pricing;
mod queries;

pub use availability::{available_rooms, booked_rooms, daily_occupancy, peak_booked_rooms};
pub use commission::{
    AgentProfile, CommissionRate, CommissionRule, DEFAULT_COMMISSION, resolve_commission,
    resolve_for_agent,
};
pub use error::EngineError;
pub use mutations::ReserveRequest;
pub use pricing::{BASE_OCCUPANTS_PER_ROOM, PricedSelection, Quote, apply_commission, compose_cost};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::model::*;

pub type SharedPropertyState = Arc<RwLock<PropertyState>>;

/// The reservation ledger, the write boundary around the pure engine.
///
/// Every property type lives behind its own write lock, and the reserve
/// path holds those locks across check-capacity, pricing, and the store
/// write. The read-decide-write sequence is therefore serialized per
/// property type: two racing booking attempts for overlapping dates can
/// never both observe availability and both commit.
pub struct Ledger {
    pub(super) properties: DashMap<Ulid, SharedPropertyState>,
    /// Booking id → property types its allocations touch.
    pub(super) booking_index: DashMap<Ulid, Vec<Ulid>>,
    pub(super) records: DashMap<Ulid, BookingRecord>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            properties: DashMap::new(),
            booking_index: DashMap::new(),
            records: DashMap::new(),
        }
    }

    pub fn get_property(&self, id: &Ulid) -> Option<SharedPropertyState> {
        self.properties.get(id).map(|e| e.value().clone())
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Acquire write locks over a set of property types in sorted id order
    /// to prevent deadlocks between concurrent multi-property bookings.
    pub(super) async fn lock_properties(
        &self,
        ids: &[Ulid],
    ) -> Result<Vec<(Ulid, OwnedRwLockWriteGuard<PropertyState>)>, EngineError> {
        let mut sorted: Vec<Ulid> = ids.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            let state = self.get_property(&id).ok_or(EngineError::NotFound(id))?;
            guards.push((id, state.write_owned().await));
        }
        Ok(guards)
    }

    /// Property types a booking's allocations touch, from the index.
    pub(super) fn properties_of_booking(&self, booking_id: &Ulid) -> Result<Vec<Ulid>, EngineError> {
        self.booking_index
            .get(booking_id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(*booking_id))
    }
}

/// Resolve a selection against a property's current rates.
pub(super) fn price_selection(state: &PropertyState, rooms: u32) -> PricedSelection {
    PricedSelection {
        property_type_id: state.property.id,
        rooms,
        base_rate: state.property.base_rate,
        extra_person_rate: state.property.extra_person_rate,
    }
}
