use std::collections::BTreeMap;

use chrono::Duration;

use crate::model::*;

// ── Availability Algorithm ────────────────────────────────────────

/// Rooms of this property type claimed by active allocations overlapping
/// the candidate stay.
///
/// Cancelled and soft-deleted allocations never count. Checked-out stays
/// do count when their range overlaps: the overlap test, not the status,
/// does the real work of excluding past stays.
pub fn booked_rooms(state: &PropertyState, candidate: &StayRange) -> u32 {
    state
        .overlapping(candidate)
        .filter(|a| a.active())
        .map(|a| a.rooms)
        .sum()
}

/// Rooms still free for the candidate stay.
///
/// Never negative: when the underlying data is overbooked (e.g. racing
/// writes before this engine owned the boundary), the result clamps to 0.
pub fn available_rooms(state: &PropertyState, candidate: &StayRange) -> u32 {
    state
        .property
        .total_rooms
        .saturating_sub(booked_rooms(state, candidate))
}

/// Per-day booked and available room counts across a window.
///
/// Sweep over check-in/check-out events: +rooms at each active
/// allocation's (clamped) check-in, -rooms at its check-out, then a
/// prefix walk day by day. Feeds the occupancy calendar.
pub fn daily_occupancy(state: &PropertyState, window: &StayRange) -> Vec<DayOccupancy> {
    let mut deltas: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
    for allocation in state.overlapping(window) {
        if !allocation.active() {
            continue;
        }
        let start = allocation.stay.check_in.max(window.check_in);
        let end = allocation.stay.check_out.min(window.check_out);
        *deltas.entry(start).or_insert(0) += i64::from(allocation.rooms);
        if end < window.check_out {
            *deltas.entry(end).or_insert(0) -= i64::from(allocation.rooms);
        }
    }

    let total = i64::from(state.property.total_rooms);
    let mut days = Vec::new();
    let mut booked: i64 = 0;
    let mut date = window.check_in;
    while date < window.check_out {
        if let Some(delta) = deltas.get(&date) {
            booked += delta;
        }
        days.push(DayOccupancy {
            date,
            booked_rooms: booked.max(0) as u32,
            available_rooms: (total - booked).max(0) as u32,
        });
        date += Duration::days(1);
    }
    days
}

/// Highest concurrent room count across the window.
pub fn peak_booked_rooms(state: &PropertyState, window: &StayRange) -> u32 {
    daily_occupancy(state, window)
        .iter()
        .map(|d| d.booked_rooms)
        .max()
        .unwrap_or(0)
}
