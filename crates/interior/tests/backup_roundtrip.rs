//! Backup specifications: a dump captures every repository and a restore
//! brings a fresh suite back to the same state.

mod common;

use common::World;
use interior::backoffice::BackofficeService;
use interior::booking::BookingRepository;
use interior::catalog::CatalogRepository;
use interior::review::ReviewRequest;
use interior::storage::memory::{
    InMemoryBookingRepository, InMemoryCatalogRepository, InMemoryLedger,
    InMemoryReviewRepository, InMemoryUserRepository,
};
use std::sync::Arc;

async fn populated_world() -> common::World {
    let world = common::world().await;

    let booking = world.book_loft(World::in_days(3), 4);
    let created = world.payments.initiate(booking.id, None).await.expect("pay");
    world
        .payments
        .process_webhook(common::succeeded_event(&created.id, booking.id.0, 100_000))
        .await
        .expect("webhook");
    world
        .reviews
        .submit(ReviewRequest {
            listing_id: world.loft,
            author_id: world.renter,
            rating: 5,
            comment: "Bright, clean, and easy to find.".to_string(),
        })
        .expect("review");
    world
        .catalog
        .toggle_favorite(world.renter, world.studio)
        .expect("favorite");

    world
}

#[tokio::test]
async fn dump_counts_every_store() {
    let world = populated_world().await;
    let dump = world.backoffice.dump().expect("dump");

    assert_eq!(dump.users.len(), 2);
    assert_eq!(dump.catalog.listings.len(), 2);
    assert_eq!(dump.catalog.cities.len(), 2);
    assert_eq!(dump.catalog.periods.len(), 2);
    assert_eq!(dump.catalog.prices.len(), 3);
    assert_eq!(dump.catalog.favorites.len(), 1);
    assert_eq!(dump.bookings.len(), 1);
    assert_eq!(dump.ledger.len(), 1);
    assert_eq!(dump.reviews.len(), 1);
}

#[tokio::test]
async fn restore_round_trips_through_json() {
    let world = populated_world().await;
    let dump = world.backoffice.dump().expect("dump");

    // Through the wire format, as the admin restore endpoint receives it.
    let bytes = serde_json::to_vec(&dump).expect("serialize");
    let dump: interior::backoffice::DatabaseDump =
        serde_json::from_slice(&bytes).expect("deserialize");

    let users = Arc::new(InMemoryUserRepository::default());
    let catalog = Arc::new(InMemoryCatalogRepository::default());
    let bookings = Arc::new(InMemoryBookingRepository::default());
    let ledger = Arc::new(InMemoryLedger::default());
    let reviews = Arc::new(InMemoryReviewRepository::default());
    let fresh = BackofficeService::new(
        users.clone(),
        catalog.clone(),
        bookings.clone(),
        ledger.clone(),
        reviews.clone(),
    );

    fresh.restore(dump).expect("restore");

    assert_eq!(catalog.listings().expect("listings").len(), 2);
    assert_eq!(bookings.all().expect("bookings").len(), 1);
    let restored = fresh.dump().expect("second dump");
    assert_eq!(restored.users.len(), 2);
    assert_eq!(restored.ledger.len(), 1);
    assert_eq!(restored.reviews.len(), 1);
    assert_eq!(restored.catalog.favorites.len(), 1);

    // New inserts continue above the restored id range.
    let booking = restored.bookings[0].clone();
    let next = bookings
        .insert(interior::booking::NewBooking {
            listing_id: booking.listing_id,
            tenant_id: booking.tenant_id,
            period_id: booking.period_id,
            starts_at: World::in_days(30),
            ends_at: World::in_days(31),
            periods_count: 1,
            price_per_period_minor: 100,
            total_amount_minor: 100,
            comment: String::new(),
        })
        .expect("insert after restore");
    assert!(next.id.0 > booking.id.0);
}

#[tokio::test]
async fn overview_reflects_the_populated_world() {
    let world = populated_world().await;
    let overview = world.backoffice.overview().expect("overview");

    assert_eq!(overview.listings.total, 2);
    assert_eq!(overview.listings.featured, 1);
    assert_eq!(overview.bookings.total, 1);
    assert_eq!(overview.bookings.pending, 1);
    assert_eq!(overview.users.total, 2);
    assert_eq!(overview.users.admins, 1);
    assert_eq!(overview.revenue.prepayments_minor, 100_000);
    // Unapproved reviews stay out of the public average.
    assert_eq!(overview.reviews.pending, 1);
    assert_eq!(overview.reviews.avg_rating, 0.0);

    let rows = world.backoffice.booking_report().expect("report");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].prepayment_paid);
    assert_eq!(rows[0].prepayment_minor, Some(100_000));
}
