//! End-to-end booking lifecycle specifications: quoting, the half-open
//! availability rule, and legal status transitions.

mod common;

use common::World;
use interior::booking::{BookingError, BookingRequest, BookingStatus};

#[tokio::test]
async fn quote_multiplies_price_and_hours() {
    let world = common::world().await;
    let quote = world
        .bookings
        .quote(world.loft, world.hour, 4)
        .expect("quote");
    assert_eq!(quote.price_per_period_minor, 250_000);
    assert_eq!(quote.total_minor, 1_000_000);
    assert_eq!(quote.total_hours, 4);
    assert_eq!(quote.period_description, "Hourly");
}

#[tokio::test]
async fn quote_fails_without_an_active_price() {
    let world = common::world().await;
    // The studio has no daily price row at all.
    let err = world
        .bookings
        .quote(world.studio, world.day, 1)
        .expect_err("no price");
    assert!(matches!(err, BookingError::PriceNotFound));
}

#[tokio::test]
async fn quote_enforces_period_bounds() {
    let world = common::world().await;
    let err = world
        .bookings
        .quote(world.studio, world.hour, 13)
        .expect_err("above max periods");
    assert!(matches!(
        err,
        BookingError::PeriodsOutOfRange { min: 1, max: 12 }
    ));
}

#[tokio::test]
async fn overlapping_active_bookings_are_rejected() {
    let world = common::world().await;
    let start = World::in_days(3);
    world.book_loft(start, 4);

    // Same interval, nested interval, and crossing interval all collide.
    for (offset, hours) in [(0_i64, 4_u32), (1, 2), (3, 4)] {
        let err = world
            .bookings
            .create(BookingRequest {
                listing_id: world.loft,
                tenant_id: world.renter,
                period_id: world.hour,
                starts_at: start + chrono::Duration::hours(offset),
                periods_count: hours,
                comment: String::new(),
            })
            .expect_err("interval is taken");
        assert!(matches!(err, BookingError::Conflict));
    }
}

#[tokio::test]
async fn touching_intervals_are_allowed() {
    let world = common::world().await;
    let start = World::in_days(3);
    world.book_loft(start, 4);

    // [start+4h, start+6h) touches the end of the first interval.
    let booking = world
        .bookings
        .create(BookingRequest {
            listing_id: world.loft,
            tenant_id: world.renter,
            period_id: world.hour,
            starts_at: start + chrono::Duration::hours(4),
            periods_count: 2,
            comment: String::new(),
        })
        .expect("back-to-back booking is fine");
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn cancelled_bookings_free_the_interval() {
    let world = common::world().await;
    let start = World::in_days(3);
    let first = world.book_loft(start, 4);
    world.bookings.cancel(first.id).expect("cancel");

    world.book_loft(start, 4);
}

#[tokio::test]
async fn lifecycle_transitions_are_enforced() {
    let world = common::world().await;
    let booking = world.book_loft(World::in_days(3), 2);

    // Completing a pending booking is illegal.
    assert!(matches!(
        world.bookings.complete(booking.id).expect_err("not confirmed"),
        BookingError::CompleteRequiresConfirmed
    ));

    let booking = world.bookings.confirm(booking.id).expect("confirm");
    assert_eq!(booking.status, BookingStatus::Confirmed);

    // Re-confirming a confirmed booking is illegal.
    assert!(matches!(
        world.bookings.confirm(booking.id).expect_err("already confirmed"),
        BookingError::ConfirmRequiresPending
    ));

    let booking = world.bookings.complete(booking.id).expect("complete");
    assert_eq!(booking.status, BookingStatus::Completed);

    // Terminal bookings cannot be cancelled or re-completed.
    assert!(matches!(
        world.bookings.cancel(booking.id).expect_err("terminal"),
        BookingError::NotCancellable
    ));
    assert!(matches!(
        world.bookings.complete(booking.id).expect_err("terminal"),
        BookingError::CompleteRequiresConfirmed
    ));
}

#[tokio::test]
async fn inactive_listings_do_not_take_bookings() {
    let world = common::world().await;
    world
        .catalog
        .update_listing(
            world.loft,
            interior::catalog::ListingUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("deactivate");

    let err = world
        .bookings
        .create(BookingRequest {
            listing_id: world.loft,
            tenant_id: world.renter,
            period_id: world.hour,
            starts_at: World::in_days(1),
            periods_count: 2,
            comment: String::new(),
        })
        .expect_err("listing is inactive");
    assert!(matches!(err, BookingError::ListingInactive));
}

#[tokio::test]
async fn user_bookings_filter_by_status() {
    let world = common::world().await;
    let first = world.book_loft(World::in_days(2), 2);
    let second = world.book_loft(World::in_days(4), 2);
    world.bookings.confirm(second.id).expect("confirm");

    let pending = world
        .bookings
        .of_user(world.renter, Some(BookingStatus::Pending))
        .expect("list");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let all = world.bookings.of_user(world.renter, None).expect("list");
    assert_eq!(all.len(), 2);
}
