use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;
use crate::store::{RecordStore, retry_read};

use super::conflict::{check_capacity, validate_stay};
use super::pricing::compose_cost;
use super::{EngineError, Ledger, Quote, price_selection};

/// A booking request as it arrives from a caller (booking form, update
/// modal, agent flow). The commission, when present, is already resolved
/// through [`super::resolve_for_agent`].
#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub booking_id: Ulid,
    pub guest: Option<String>,
    pub stay: StayRange,
    pub selections: Vec<RoomSelection>,
    pub occupants: u32,
    pub category: BookingCategory,
    pub agent: Option<Ulid>,
    pub commission: Option<super::CommissionRate>,
    pub advance_paid: Paise,
}

impl ReserveRequest {
    /// Requested rooms per property type, with repeated selections of one
    /// property summed so the capacity check sees the whole claim.
    fn rooms_by_property(&self) -> BTreeMap<Ulid, u32> {
        let mut by_property: BTreeMap<Ulid, u32> = BTreeMap::new();
        for selection in &self.selections {
            *by_property.entry(selection.property_type_id).or_insert(0) += selection.rooms;
        }
        by_property
    }

    pub(super) fn validate(&self) -> Result<(), EngineError> {
        validate_stay(&self.stay)?;
        if self.selections.is_empty() {
            return Err(EngineError::InvalidRequest("no rooms selected"));
        }
        if self.selections.len() > MAX_SELECTIONS_PER_BOOKING {
            return Err(EngineError::LimitExceeded("too many selections"));
        }
        for selection in &self.selections {
            if selection.rooms == 0 {
                return Err(EngineError::InvalidRequest("selection of zero rooms"));
            }
            if selection.rooms > MAX_ROOMS_PER_SELECTION {
                return Err(EngineError::LimitExceeded("too many rooms in one selection"));
            }
        }
        if let Some(ref guest) = self.guest
            && guest.len() > MAX_NAME_LEN
        {
            return Err(EngineError::LimitExceeded("guest name too long"));
        }
        if self.agent.is_some() && self.commission.is_none() {
            // The caller must resolve (and thereby approve) the agent first.
            return Err(EngineError::InvalidRequest(
                "agent booking without resolved commission",
            ));
        }
        if self.advance_paid < 0 {
            return Err(EngineError::InvalidRequest("negative advance payment"));
        }
        match self.category {
            BookingCategory::Standard { discount } => match discount {
                Discount::Flat(amount) if amount < 0 => {
                    return Err(EngineError::InvalidRequest("negative flat discount"));
                }
                Discount::Percent(bps) if bps > 10_000 => {
                    return Err(EngineError::InvalidRequest("discount above 100%"));
                }
                _ => {}
            },
            BookingCategory::ManuallyPriced { agreed_total } if agreed_total < 0 => {
                return Err(EngineError::InvalidRequest("negative agreed total"));
            }
            _ => {}
        }
        Ok(())
    }
}

impl Ledger {
    // ── Property-type administration ─────────────────────────

    pub fn register_property_type(&self, property: PropertyType) -> Result<(), EngineError> {
        if self.properties.len() >= MAX_PROPERTY_TYPES {
            return Err(EngineError::LimitExceeded("too many property types"));
        }
        if property.name.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("property name too long"));
        }
        if self.properties.contains_key(&property.id) {
            return Err(EngineError::AlreadyExists(property.id));
        }
        let id = property.id;
        self.properties
            .insert(id, Arc::new(RwLock::new(PropertyState::new(property))));
        metrics::gauge!(observability::PROPERTY_TYPES_ACTIVE).increment(1.0);
        tracing::info!("registered property type {id}");
        Ok(())
    }

    /// Replace rates, inventory count, name and bookable flag. Allocations
    /// are untouched; the next availability read sees the new inventory.
    pub async fn update_property_type(&self, property: PropertyType) -> Result<(), EngineError> {
        if property.name.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("property name too long"));
        }
        let state = self
            .get_property(&property.id)
            .ok_or(EngineError::NotFound(property.id))?;
        let mut guard = state.write().await;
        guard.property = property;
        Ok(())
    }

    /// Remove a property type. Refused while any active allocation claims
    /// its rooms.
    pub async fn remove_property_type(&self, id: Ulid) -> Result<(), EngineError> {
        let state = self.get_property(&id).ok_or(EngineError::NotFound(id))?;
        let guard = state.read().await;
        if guard.allocations.iter().any(|a| a.active()) {
            return Err(EngineError::InvalidRequest(
                "property type has active allocations",
            ));
        }
        drop(guard);
        self.properties.remove(&id);
        metrics::gauge!(observability::PROPERTY_TYPES_ACTIVE).decrement(1.0);
        Ok(())
    }

    // ── Hydration ────────────────────────────────────────────

    /// Load property types and bookings from the external store. Reads go
    /// through the retrying path; a store that stays unreachable surfaces
    /// an error instead of an empty (read: "fully booked") ledger.
    pub async fn hydrate(&self, store: &dyn RecordStore) -> Result<(), EngineError> {
        let property_types = retry_read(|| store.fetch_property_types()).await?;
        for property in property_types {
            self.register_property_type(property)?;
        }

        let bookings = retry_read(|| store.fetch_bookings()).await?;
        let count = bookings.len();
        for record in bookings {
            for allocation in &record.allocations {
                let state = self
                    .get_property(&allocation.property_type_id)
                    .ok_or(EngineError::NotFound(allocation.property_type_id))?;
                // Readers may already be querying mid-hydration; wait for
                // the lock instead of assuming exclusivity.
                let mut guard = state.write().await;
                guard.insert_allocation(allocation.clone());
            }
            self.index_record(&record);
        }
        tracing::info!(
            "hydrated {} property types, {count} bookings",
            self.properties.len()
        );
        Ok(())
    }

    fn index_record(&self, record: &BookingRecord) {
        let mut touched: Vec<Ulid> = record
            .allocations
            .iter()
            .map(|a| a.property_type_id)
            .collect();
        touched.sort();
        touched.dedup();
        self.booking_index.insert(record.id, touched);
        self.records.insert(record.id, record.clone());
    }

    // ── Reservation ──────────────────────────────────────────

    /// Atomically reserve rooms for a booking: validate, lock every touched
    /// property type (sorted order), check capacity for the whole claim,
    /// price, persist through the store, then commit to ledger state.
    ///
    /// All-or-nothing: any capacity shortfall or store failure leaves the
    /// ledger exactly as it was.
    pub async fn reserve(
        &self,
        store: &dyn RecordStore,
        request: ReserveRequest,
    ) -> Result<BookingRecord, EngineError> {
        let started = Instant::now();
        request.validate()?;
        if self.records.contains_key(&request.booking_id) {
            return Err(EngineError::AlreadyExists(request.booking_id));
        }

        let by_property = request.rooms_by_property();
        let property_ids: Vec<Ulid> = by_property.keys().copied().collect();
        let guards = self.lock_properties(&property_ids).await?;

        // Phase 1: validate the whole claim against current state.
        for (id, guard) in &guards {
            if !guard.property.bookable {
                return Err(EngineError::NotBookable(*id));
            }
            check_capacity(guard, &request.stay, by_property[id]).inspect_err(|_| {
                metrics::counter!(observability::CAPACITY_CONFLICTS_TOTAL).increment(1);
            })?;
        }

        // Phase 2: price against the locked rates.
        let selections = guards
            .iter()
            .map(|(id, guard)| price_selection(guard, by_property[id]))
            .collect();
        let quote = Quote {
            selections,
            stay: request.stay,
            occupants: request.occupants,
            commission: request.commission,
            category: request.category,
            advance_paid: request.advance_paid,
        };
        let breakdown = compose_cost(&quote);

        let allocations: Vec<RoomAllocation> = by_property
            .iter()
            .map(|(&property_type_id, &rooms)| RoomAllocation {
                id: Ulid::new(),
                booking_id: request.booking_id,
                property_type_id,
                stay: request.stay,
                rooms,
                status: BookingStatus::Pending,
                deleted: false,
            })
            .collect();
        let record = BookingRecord {
            id: request.booking_id,
            guest: request.guest.clone(),
            stay: request.stay,
            occupants: request.occupants,
            category: request.category,
            agent: request.agent,
            allocations,
            breakdown,
            status: BookingStatus::Pending,
            deleted: false,
        };

        // Phase 3: persist, then commit. The write locks are still held, so
        // nothing can interleave between the store write and the state
        // update.
        store.insert_booking(&record).await.map_err(|e| {
            metrics::counter!(observability::STORE_WRITE_FAILURES_TOTAL).increment(1);
            tracing::warn!("store rejected booking {}: {e}", record.id);
            EngineError::Store(e)
        })?;

        let mut guards = guards;
        for allocation in &record.allocations {
            let slot = guards
                .iter_mut()
                .find(|(id, _)| *id == allocation.property_type_id)
                .map(|(_, guard)| guard);
            if let Some(guard) = slot {
                guard.insert_allocation(allocation.clone());
            }
        }
        self.index_record(&record);

        metrics::counter!(observability::RESERVATIONS_CONFIRMED_TOTAL).increment(1);
        metrics::histogram!(observability::RESERVE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            "reserved booking {} ({} property types, total {})",
            record.id,
            record.allocations.len(),
            record.breakdown.total
        );
        Ok(record)
    }

    // ── Lifecycle transitions ────────────────────────────────

    pub async fn confirm_booking(
        &self,
        store: &dyn RecordStore,
        id: Ulid,
    ) -> Result<(), EngineError> {
        self.transition(store, id, BookingStatus::Confirmed).await
    }

    pub async fn check_in(&self, store: &dyn RecordStore, id: Ulid) -> Result<(), EngineError> {
        self.transition(store, id, BookingStatus::CheckedIn).await
    }

    pub async fn check_out(&self, store: &dyn RecordStore, id: Ulid) -> Result<(), EngineError> {
        self.transition(store, id, BookingStatus::CheckedOut).await
    }

    /// Cancel a booking. Allocations stay in place but stop counting
    /// against inventory, so the rooms return to availability.
    pub async fn cancel_booking(
        &self,
        store: &dyn RecordStore,
        id: Ulid,
    ) -> Result<(), EngineError> {
        self.transition(store, id, BookingStatus::Cancelled).await?;
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        Ok(())
    }

    async fn transition(
        &self,
        store: &dyn RecordStore,
        id: Ulid,
        next: BookingStatus,
    ) -> Result<(), EngineError> {
        let property_ids = self.properties_of_booking(&id)?;
        let mut guards = self.lock_properties(&property_ids).await?;

        let from = {
            let record = self.records.get(&id).ok_or(EngineError::NotFound(id))?;
            record.status
        };
        if !from.can_become(next) {
            return Err(EngineError::IllegalTransition { from, to: next });
        }

        store.set_booking_status(id, next).await.map_err(|e| {
            metrics::counter!(observability::STORE_WRITE_FAILURES_TOTAL).increment(1);
            EngineError::Store(e)
        })?;

        if let Some(mut record) = self.records.get_mut(&id) {
            record.status = next;
            for allocation in &mut record.allocations {
                allocation.status = next;
            }
        }
        for (_, guard) in &mut guards {
            for allocation in guard.allocations_for_booking_mut(id) {
                allocation.status = next;
            }
        }
        tracing::info!("booking {id}: {from} -> {next}");
        Ok(())
    }

    /// Soft-delete a booking. Like cancellation this frees the rooms, but
    /// it is status-independent. Staff use it to hide bad records.
    pub async fn mark_deleted(&self, store: &dyn RecordStore, id: Ulid) -> Result<(), EngineError> {
        let property_ids = self.properties_of_booking(&id)?;
        let mut guards = self.lock_properties(&property_ids).await?;

        store.set_booking_deleted(id).await.map_err(|e| {
            metrics::counter!(observability::STORE_WRITE_FAILURES_TOTAL).increment(1);
            EngineError::Store(e)
        })?;

        if let Some(mut record) = self.records.get_mut(&id) {
            record.deleted = true;
            for allocation in &mut record.allocations {
                allocation.deleted = true;
            }
        }
        for (_, guard) in &mut guards {
            for allocation in guard.allocations_for_booking_mut(id) {
                allocation.deleted = true;
            }
        }
        tracing::info!("booking {id} soft-deleted");
        Ok(())
    }
}
