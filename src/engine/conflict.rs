use chrono::Datelike;

use crate::limits::*;
use crate::model::*;

use super::EngineError;
use super::availability::booked_rooms;

pub(crate) fn validate_stay(stay: &StayRange) -> Result<(), EngineError> {
    if stay.check_out <= stay.check_in {
        return Err(EngineError::InvalidStay("check_out must be after check_in"));
    }
    if stay.check_in.year() < MIN_VALID_YEAR || stay.check_out.year() > MAX_VALID_YEAR {
        return Err(EngineError::InvalidStay("date out of range"));
    }
    if stay.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

/// Reserve-if-available guard. Must run with the property's write lock
/// held so the availability read and the subsequent commit are one
/// critical section.
pub(crate) fn check_capacity(
    state: &PropertyState,
    stay: &StayRange,
    requested: u32,
) -> Result<(), EngineError> {
    let booked = booked_rooms(state, stay);
    let available = state.property.total_rooms.saturating_sub(booked);
    if requested > available {
        return Err(EngineError::CapacityExceeded {
            property_type: state.property.id,
            requested,
            available,
        });
    }
    Ok(())
}
