use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::availability::{available_rooms, daily_occupancy};
use super::conflict::validate_stay;
use super::pricing::compose_cost;
use super::{EngineError, Ledger, Quote, ReserveRequest, price_selection};

impl Ledger {
    /// Rooms of one property type still free for a candidate stay.
    pub async fn available_rooms(
        &self,
        property_type_id: Ulid,
        stay: &StayRange,
    ) -> Result<u32, EngineError> {
        validate_stay(stay)?;
        let state = self
            .get_property(&property_type_id)
            .ok_or(EngineError::NotFound(property_type_id))?;
        let guard = state.read().await;
        Ok(available_rooms(&guard, stay))
    }

    /// Property types open for booking with at least `min_rooms` free in
    /// the candidate window. Feeds the booking form's choices, so
    /// `min_rooms` is floored at 1: a fully booked property is never
    /// offered, even for a zero-room query.
    pub async fn bookable_property_types(
        &self,
        stay: &StayRange,
        min_rooms: u32,
    ) -> Result<Vec<PropertyAvailability>, EngineError> {
        validate_stay(stay)?;
        let states: Vec<_> = self.properties.iter().map(|e| e.value().clone()).collect();

        let mut result = Vec::new();
        for state in states {
            let guard = state.read().await;
            if !guard.property.bookable {
                continue;
            }
            let free = available_rooms(&guard, stay);
            if free >= min_rooms.max(1) {
                result.push(PropertyAvailability {
                    property_type_id: guard.property.id,
                    name: guard.property.name.clone(),
                    available_rooms: free,
                    base_rate: guard.property.base_rate,
                    extra_person_rate: guard.property.extra_person_rate,
                });
            }
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    /// Day-by-day occupancy for one property type, for the admin dashboard
    /// calendar.
    pub async fn occupancy_calendar(
        &self,
        property_type_id: Ulid,
        window: &StayRange,
    ) -> Result<Vec<DayOccupancy>, EngineError> {
        if window.check_out <= window.check_in {
            return Err(EngineError::InvalidStay("window end must be after start"));
        }
        if (window.check_out - window.check_in).num_days() > MAX_QUERY_WINDOW_DAYS {
            return Err(EngineError::LimitExceeded("query window too wide"));
        }
        let state = self
            .get_property(&property_type_id)
            .ok_or(EngineError::NotFound(property_type_id))?;
        let guard = state.read().await;
        Ok(daily_occupancy(&guard, window))
    }

    /// Price a booking request without reserving anything. Pure over the
    /// current rates: identical requests quote identically, and a request
    /// the reserve path would refuse is refused here too.
    pub async fn quote(&self, request: &ReserveRequest) -> Result<PriceBreakdown, EngineError> {
        request.validate()?;

        let mut selections = Vec::with_capacity(request.selections.len());
        for selection in &request.selections {
            let state = self
                .get_property(&selection.property_type_id)
                .ok_or(EngineError::NotFound(selection.property_type_id))?;
            let guard = state.read().await;
            selections.push(price_selection(&guard, selection.rooms));
        }

        let quote = Quote {
            selections,
            stay: request.stay,
            occupants: request.occupants,
            commission: request.commission,
            category: request.category,
            advance_paid: request.advance_paid,
        };
        Ok(compose_cost(&quote))
    }

    /// All allocations of one property type, active or not.
    pub async fn list_allocations(
        &self,
        property_type_id: Ulid,
    ) -> Result<Vec<RoomAllocation>, EngineError> {
        let state = self
            .get_property(&property_type_id)
            .ok_or(EngineError::NotFound(property_type_id))?;
        let guard = state.read().await;
        Ok(guard.allocations.clone())
    }

    pub fn booking_record(&self, id: &Ulid) -> Option<BookingRecord> {
        self.records.get(id).map(|e| e.value().clone())
    }
}
