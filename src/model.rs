use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Money in paise (minor units). The only money type.
pub type Paise = i64;

/// Convert whole rupees to paise.
pub const fn rupees(r: i64) -> Paise {
    r * 100
}

/// Half-open stay interval `[check_in, check_out)` at day granularity.
///
/// Day granularity is structural: a `NaiveDate` carries no time-of-day, so
/// timezone noise cannot produce spurious overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "StayRange check_in must precede check_out");
        Self { check_in, check_out }
    }

    /// A checkout on day N and a check-in on day N do not conflict.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Stay length in nights, clamped to at least 1 so malformed ranges
    /// never price at zero nights.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

/// Lifecycle of a booking. Cancellation is a status, not a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    /// Only cancellation releases rooms. Checked-out stays still count and
    /// rely on date non-overlap to not collide with future candidates.
    pub fn counts_against_inventory(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Legal forward transitions of the booking lifecycle.
    pub fn can_become(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, CheckedIn)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One booking's claim on rooms of a property type for a stay range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAllocation {
    pub id: Ulid,
    pub booking_id: Ulid,
    pub property_type_id: Ulid,
    pub stay: StayRange,
    pub rooms: u32,
    pub status: BookingStatus,
    pub deleted: bool,
}

impl RoomAllocation {
    /// Whether this allocation currently claims inventory.
    pub fn active(&self) -> bool {
        !self.deleted && self.status.counts_against_inventory()
    }
}

/// A category of rentable unit with a fixed inventory count and nightly
/// rates, not an individual physical room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: Ulid,
    pub name: String,
    pub total_rooms: u32,
    /// Nightly rate covering up to two occupants per room.
    pub base_rate: Paise,
    /// Nightly surcharge per occupant beyond base capacity.
    pub extra_person_rate: Paise,
    /// Administratively open for new bookings.
    pub bookable: bool,
}

/// A property type plus every allocation claiming its rooms, sorted by
/// check-in date for binary-search window scans.
#[derive(Debug, Clone)]
pub struct PropertyState {
    pub property: PropertyType,
    pub allocations: Vec<RoomAllocation>,
}

impl PropertyState {
    pub fn new(property: PropertyType) -> Self {
        Self {
            property,
            allocations: Vec::new(),
        }
    }

    /// Insert maintaining sort order by `stay.check_in`.
    pub fn insert_allocation(&mut self, allocation: RoomAllocation) {
        let pos = self
            .allocations
            .binary_search_by_key(&allocation.stay.check_in, |a| a.stay.check_in)
            .unwrap_or_else(|e| e);
        self.allocations.insert(pos, allocation);
    }

    /// Allocations whose stay overlaps the query window, active or not.
    /// Binary search skips everything checking in at or after `query.check_out`.
    pub fn overlapping(&self, query: &StayRange) -> impl Iterator<Item = &RoomAllocation> {
        let query = *query;
        let right_bound = self
            .allocations
            .partition_point(|a| a.stay.check_in < query.check_out);
        self.allocations[..right_bound]
            .iter()
            .filter(move |a| a.stay.check_out > query.check_in)
    }

    /// Mutable access to every allocation belonging to one booking.
    pub fn allocations_for_booking_mut(
        &mut self,
        booking_id: Ulid,
    ) -> impl Iterator<Item = &mut RoomAllocation> {
        self.allocations
            .iter_mut()
            .filter(move |a| a.booking_id == booking_id)
    }
}

/// One property type and room count chosen in a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSelection {
    pub property_type_id: Ulid,
    pub rooms: u32,
}

/// Discount applied to the subtotal of a standard booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discount {
    None,
    Flat(Paise),
    /// Basis points of the subtotal.
    Percent(u32),
}

/// How a booking is priced. Manually priced and promotional bookings are
/// terminal branches with their own cost rule, not flags on the general path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCategory {
    Standard { discount: Discount },
    /// Externally negotiated and prepaid: flat total, nothing due.
    ManuallyPriced { agreed_total: Paise },
    /// Zero cost, zero due by definition.
    Promotional,
}

/// Computed price breakdown for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Paise,
    pub discount: Paise,
    pub total: Paise,
    pub advance_paid: Paise,
    /// May be negative when overpaid; read through [`Self::due_owed`].
    pub due: Paise,
}

impl PriceBreakdown {
    pub const fn zero() -> Self {
        Self {
            subtotal: 0,
            discount: 0,
            total: 0,
            advance_paid: 0,
            due: 0,
        }
    }

    /// Amount the guest still owes. Overpayment reads as zero due, never a
    /// refund.
    pub fn due_owed(&self) -> Paise {
        self.due.max(0)
    }
}

/// The booking as persisted through the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Ulid,
    pub guest: Option<String>,
    pub stay: StayRange,
    pub occupants: u32,
    pub category: BookingCategory,
    pub agent: Option<Ulid>,
    pub allocations: Vec<RoomAllocation>,
    pub breakdown: PriceBreakdown,
    pub status: BookingStatus,
    pub deleted: bool,
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAvailability {
    pub property_type_id: Ulid,
    pub name: String,
    pub available_rooms: u32,
    pub base_rate: Paise,
    pub extra_person_rate: Paise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOccupancy {
    pub date: NaiveDate,
    pub booked_rooms: u32,
    pub available_rooms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stay(a: u32, b: u32) -> StayRange {
        StayRange::new(d(2026, 1, a), d(2026, 1, b))
    }

    fn alloc(booking_id: Ulid, s: StayRange, rooms: u32) -> RoomAllocation {
        RoomAllocation {
            id: Ulid::new(),
            booking_id,
            property_type_id: Ulid::new(),
            stay: s,
            rooms,
            status: BookingStatus::Confirmed,
            deleted: false,
        }
    }

    fn tent(total_rooms: u32) -> PropertyType {
        PropertyType {
            id: Ulid::new(),
            name: "Deluxe Tent".into(),
            total_rooms,
            base_rate: rupees(2000),
            extra_person_rate: rupees(500),
            bookable: true,
        }
    }

    #[test]
    fn stay_basics() {
        let s = stay(10, 15);
        assert_eq!(s.nights(), 5);
        assert!(s.contains_date(d(2026, 1, 10)));
        assert!(s.contains_date(d(2026, 1, 14)));
        assert!(!s.contains_date(d(2026, 1, 15))); // half-open
    }

    #[test]
    fn stay_overlap() {
        let a = stay(10, 15);
        let b = stay(12, 18);
        let c = stay(15, 20);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // back-to-back: checkout day == check-in day
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn stay_disjoint_never_overlaps() {
        let a = stay(1, 5);
        let b = stay(6, 9);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn stay_shared_day_always_overlaps() {
        let a = stay(1, 11);
        let b = stay(10, 12); // shares Jan 10
        assert!(a.overlaps(&b));
    }

    #[test]
    fn nights_floor_is_one() {
        // Malformed same-day range still prices one night.
        let s = StayRange {
            check_in: d(2026, 1, 10),
            check_out: d(2026, 1, 10),
        };
        assert_eq!(s.nights(), 1);
    }

    #[test]
    fn status_inventory_rules() {
        assert!(BookingStatus::Pending.counts_against_inventory());
        assert!(BookingStatus::Confirmed.counts_against_inventory());
        assert!(BookingStatus::CheckedIn.counts_against_inventory());
        assert!(BookingStatus::CheckedOut.counts_against_inventory());
        assert!(!BookingStatus::Cancelled.counts_against_inventory());
    }

    #[test]
    fn status_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_become(Confirmed));
        assert!(Pending.can_become(Cancelled));
        assert!(Confirmed.can_become(CheckedIn));
        assert!(CheckedIn.can_become(CheckedOut));
        assert!(!CheckedIn.can_become(Cancelled));
        assert!(!CheckedOut.can_become(CheckedIn));
        assert!(!Cancelled.can_become(Confirmed));
    }

    #[test]
    fn allocation_active_flags() {
        let mut a = alloc(Ulid::new(), stay(10, 15), 2);
        assert!(a.active());
        a.status = BookingStatus::Cancelled;
        assert!(!a.active());
        a.status = BookingStatus::Confirmed;
        a.deleted = true;
        assert!(!a.active());
    }

    #[test]
    fn insert_keeps_check_in_order() {
        let mut state = PropertyState::new(tent(5));
        state.insert_allocation(alloc(Ulid::new(), stay(20, 25), 1));
        state.insert_allocation(alloc(Ulid::new(), stay(5, 8), 1));
        state.insert_allocation(alloc(Ulid::new(), stay(12, 14), 1));
        let check_ins: Vec<_> = state.allocations.iter().map(|a| a.stay.check_in).collect();
        assert_eq!(check_ins, vec![d(2026, 1, 5), d(2026, 1, 12), d(2026, 1, 20)]);
    }

    #[test]
    fn overlapping_scan_skips_disjoint() {
        let mut state = PropertyState::new(tent(5));
        state.insert_allocation(alloc(Ulid::new(), stay(1, 4), 1)); // past
        state.insert_allocation(alloc(Ulid::new(), stay(10, 15), 2)); // hit
        state.insert_allocation(alloc(Ulid::new(), stay(20, 25), 1)); // future
        let hits: Vec<_> = state.overlapping(&stay(12, 14)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rooms, 2);
    }

    #[test]
    fn overlapping_back_to_back_not_included() {
        let mut state = PropertyState::new(tent(5));
        state.insert_allocation(alloc(Ulid::new(), stay(10, 15), 2));
        // Candidate checks in the day the existing stay checks out.
        let hits: Vec<_> = state.overlapping(&stay(15, 20)).collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn overlapping_spanning_candidate_included() {
        let mut state = PropertyState::new(tent(5));
        state.insert_allocation(alloc(Ulid::new(), stay(1, 31), 3));
        let hits: Vec<_> = state.overlapping(&stay(10, 12)).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn allocations_for_booking_mut_targets_one_booking() {
        let booking = Ulid::new();
        let mut state = PropertyState::new(tent(5));
        state.insert_allocation(alloc(booking, stay(10, 15), 1));
        state.insert_allocation(alloc(Ulid::new(), stay(10, 15), 1));
        state.insert_allocation(alloc(booking, stay(20, 22), 1));
        for a in state.allocations_for_booking_mut(booking) {
            a.status = BookingStatus::Cancelled;
        }
        let cancelled = state
            .allocations
            .iter()
            .filter(|a| a.status == BookingStatus::Cancelled)
            .count();
        assert_eq!(cancelled, 2);
    }

    #[test]
    fn due_owed_clamps_overpayment() {
        let b = PriceBreakdown {
            subtotal: rupees(1000),
            discount: 0,
            total: rupees(1000),
            advance_paid: rupees(1500),
            due: rupees(-500),
        };
        assert_eq!(b.due_owed(), 0);
        assert_eq!(b.due, rupees(-500)); // raw value preserved
    }

    #[test]
    fn booking_record_serde_roundtrip() {
        let booking_id = Ulid::new();
        let record = BookingRecord {
            id: booking_id,
            guest: Some("Asha".into()),
            stay: stay(10, 14),
            occupants: 4,
            category: BookingCategory::Standard {
                discount: Discount::Flat(rupees(500)),
            },
            agent: None,
            allocations: vec![alloc(booking_id, stay(10, 14), 2)],
            breakdown: PriceBreakdown::zero(),
            status: BookingStatus::Pending,
            deleted: false,
        };
        let json = serde_json::to_string(&record).unwrap();
        let decoded: BookingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, decoded);
    }
}
