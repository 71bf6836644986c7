use ulid::Ulid;

use crate::model::*;

use super::commission::CommissionRate;

/// Occupants each room accommodates at the base nightly rate.
pub const BASE_OCCUPANTS_PER_ROOM: u32 = 2;

/// One selection with its rates resolved from the property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedSelection {
    pub property_type_id: Ulid,
    pub rooms: u32,
    pub base_rate: Paise,
    pub extra_person_rate: Paise,
}

/// Everything the cost composer needs. The commission, when present, is
/// already resolved by the caller; the composer never looks up rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub selections: Vec<PricedSelection>,
    pub stay: StayRange,
    pub occupants: u32,
    pub commission: Option<CommissionRate>,
    pub category: BookingCategory,
    pub advance_paid: Paise,
}

/// Discount a nightly rate by an agent commission.
pub fn apply_commission(rate: Paise, commission: CommissionRate) -> Paise {
    rate * i64::from(10_000 - commission.basis_points()) / 10_000
}

/// Compose the full price breakdown for a booking request.
///
/// Manually-priced and promotional bookings are terminal branches; only
/// standard bookings run the nightly-rate arithmetic.
pub fn compose_cost(quote: &Quote) -> PriceBreakdown {
    match quote.category {
        BookingCategory::ManuallyPriced { agreed_total } => PriceBreakdown {
            subtotal: agreed_total,
            discount: 0,
            total: agreed_total,
            advance_paid: agreed_total,
            due: 0,
        },
        BookingCategory::Promotional => PriceBreakdown::zero(),
        BookingCategory::Standard { discount } => compose_standard(quote, discount),
    }
}

fn compose_standard(quote: &Quote, discount: Discount) -> PriceBreakdown {
    let nights = quote.stay.nights();

    let mut room_cost: Paise = 0;
    let mut total_rooms: u32 = 0;
    let mut extra_rate_total: Paise = 0;

    for selection in &quote.selections {
        let (base, extra) = match quote.commission {
            // Commission discounts both the base and the extra-person rate.
            Some(c) => (
                apply_commission(selection.base_rate, c),
                apply_commission(selection.extra_person_rate, c),
            ),
            None => (selection.base_rate, selection.extra_person_rate),
        };
        room_cost += base * i64::from(selection.rooms) * nights;
        extra_rate_total += extra * i64::from(selection.rooms);
        total_rooms += selection.rooms;
    }

    let base_capacity = total_rooms * BASE_OCCUPANTS_PER_ROOM;
    let extra_occupants = quote.occupants.saturating_sub(base_capacity);

    let mut subtotal = room_cost;
    if extra_occupants > 0 && total_rooms > 0 {
        // Extra occupants are not pinned to a specific room, so the charge
        // uses the average extra-person rate across all selected rooms.
        let average_extra_rate = extra_rate_total / i64::from(total_rooms);
        subtotal += i64::from(extra_occupants) * average_extra_rate * nights;
    }

    let discount_amount = match discount {
        Discount::None => 0,
        Discount::Flat(amount) => amount,
        Discount::Percent(bps) => subtotal * i64::from(bps) / 10_000,
    };
    // A discount can never exceed what it discounts, and never adds.
    let discount_amount = discount_amount.clamp(0, subtotal.max(0));

    let total = subtotal - discount_amount;
    PriceBreakdown {
        subtotal,
        discount: discount_amount,
        total,
        advance_paid: quote.advance_paid,
        due: total - quote.advance_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn stay(a: u32, b: u32) -> StayRange {
        StayRange::new(d(a), d(b))
    }

    fn selection(rooms: u32, base: i64, extra: i64) -> PricedSelection {
        PricedSelection {
            property_type_id: Ulid::new(),
            rooms,
            base_rate: rupees(base),
            extra_person_rate: rupees(extra),
        }
    }

    fn standard_quote(selections: Vec<PricedSelection>, s: StayRange, occupants: u32) -> Quote {
        Quote {
            selections,
            stay: s,
            occupants,
            commission: None,
            category: BookingCategory::Standard {
                discount: Discount::None,
            },
            advance_paid: 0,
        }
    }

    #[test]
    fn two_rooms_three_nights_with_extra_occupants() {
        // 2 rooms @ ₹2000/night, 3 nights, 6 occupants, extra ₹500/night:
        // room cost 12000, 2 extra occupants, subtotal 15000.
        let quote = standard_quote(vec![selection(2, 2000, 500)], stay(10, 13), 6);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(15_000));
        assert_eq!(breakdown.total, rupees(15_000));
        assert_eq!(breakdown.due, rupees(15_000));
    }

    #[test]
    fn no_extra_occupants_means_subtotal_equals_room_cost() {
        let quote = standard_quote(vec![selection(2, 2000, 500)], stay(10, 13), 4);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(2 * 2000 * 3));
    }

    #[test]
    fn agent_commission_discounts_room_cost() {
        // 10% commission on ₹1000/night, 1 room, 2 nights → ₹1800.
        let mut quote = standard_quote(vec![selection(1, 1000, 200)], stay(10, 12), 2);
        quote.commission = CommissionRate::from_percent(10);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(1800));
    }

    #[test]
    fn zero_commission_matches_no_commission() {
        let base = standard_quote(vec![selection(2, 1500, 300)], stay(10, 14), 4);
        let mut zero = base.clone();
        zero.commission = CommissionRate::from_percent(0);
        assert_eq!(compose_cost(&base), compose_cost(&zero));
    }

    #[test]
    fn maximum_commission_leaves_one_percent_of_rate() {
        // 99% commission on ₹1500/night, 2 rooms, 4 nights → ₹120.
        let mut quote = standard_quote(vec![selection(2, 1500, 300)], stay(10, 14), 4);
        quote.commission = CommissionRate::from_percent(99);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(120));
    }

    #[test]
    fn extra_charge_uses_average_rate_across_selections() {
        // 1 room @ extra ₹400 + 1 room @ extra ₹600 → average ₹500.
        // 2 rooms, base capacity 4, 5 occupants → 1 extra.
        let quote = standard_quote(
            vec![selection(1, 2000, 400), selection(1, 3000, 600)],
            stay(10, 12),
            5,
        );
        let breakdown = compose_cost(&quote);
        let room_cost = rupees((2000 + 3000) * 2);
        assert_eq!(breakdown.subtotal, room_cost + rupees(500 * 2));
    }

    #[test]
    fn flat_discount_subtracts_from_subtotal() {
        let mut quote = standard_quote(vec![selection(1, 2000, 500)], stay(10, 12), 2);
        quote.category = BookingCategory::Standard {
            discount: Discount::Flat(rupees(300)),
        };
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(4000));
        assert_eq!(breakdown.discount, rupees(300));
        assert_eq!(breakdown.total, rupees(3700));
    }

    #[test]
    fn percent_discount_is_share_of_subtotal() {
        let mut quote = standard_quote(vec![selection(1, 2000, 500)], stay(10, 12), 2);
        quote.category = BookingCategory::Standard {
            discount: Discount::Percent(1_500), // 15%
        };
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.discount, rupees(600));
        assert_eq!(breakdown.total, rupees(3400));
    }

    #[test]
    fn flat_discount_clamps_at_subtotal() {
        // Discounting more than the stay costs bottoms out at free.
        let mut quote = standard_quote(vec![selection(1, 2000, 500)], stay(10, 12), 2);
        quote.category = BookingCategory::Standard {
            discount: Discount::Flat(rupees(10_000)),
        };
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(4000));
        assert_eq!(breakdown.discount, rupees(4000));
        assert_eq!(breakdown.total, 0);
    }

    #[test]
    fn negative_flat_discount_never_adds() {
        let mut quote = standard_quote(vec![selection(1, 2000, 500)], stay(10, 12), 2);
        quote.category = BookingCategory::Standard {
            discount: Discount::Flat(rupees(-300)),
        };
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.discount, 0);
        assert_eq!(breakdown.total, rupees(4000));
    }

    #[test]
    fn total_plus_discount_reconstructs_subtotal() {
        let mut quote = standard_quote(vec![selection(3, 1750, 450)], stay(5, 11), 9);
        quote.category = BookingCategory::Standard {
            discount: Discount::Flat(rupees(1234)),
        };
        let b = compose_cost(&quote);
        assert_eq!(b.total + b.discount, b.subtotal);
    }

    #[test]
    fn advance_reduces_due() {
        let mut quote = standard_quote(vec![selection(1, 2000, 500)], stay(10, 12), 2);
        quote.advance_paid = rupees(1000);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.due, rupees(3000));
    }

    #[test]
    fn overpaid_advance_goes_negative_but_owes_zero() {
        let mut quote = standard_quote(vec![selection(1, 2000, 500)], stay(10, 12), 2);
        quote.advance_paid = rupees(5000);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.due, rupees(-1000));
        assert_eq!(breakdown.due_owed(), 0);
    }

    #[test]
    fn manually_priced_is_flat_with_zero_due() {
        let mut quote = standard_quote(vec![selection(2, 2000, 500)], stay(10, 13), 6);
        quote.category = BookingCategory::ManuallyPriced {
            agreed_total: rupees(9999),
        };
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.total, rupees(9999));
        assert_eq!(breakdown.advance_paid, rupees(9999));
        assert_eq!(breakdown.due, 0);
    }

    #[test]
    fn promotional_is_all_zero() {
        let mut quote = standard_quote(vec![selection(2, 2000, 500)], stay(10, 13), 6);
        quote.category = BookingCategory::Promotional;
        assert_eq!(compose_cost(&quote), PriceBreakdown::zero());
    }

    #[test]
    fn malformed_same_day_range_prices_one_night() {
        let s = StayRange {
            check_in: d(10),
            check_out: d(10),
        };
        let quote = standard_quote(vec![selection(1, 2000, 500)], s, 2);
        let breakdown = compose_cost(&quote);
        assert_eq!(breakdown.subtotal, rupees(2000));
    }
}
