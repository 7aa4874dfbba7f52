#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use interior::accounts::{AccountService, NewUserAccount, UserId, UserRole};
use interior::backoffice::BackofficeService;
use interior::booking::{Booking, BookingRequest, BookingService};
use interior::catalog::{
    CatalogService, CategoryId, City, CityId, ListingId, ListingPrice, NewListing,
    RentalPeriod, RentalPeriodId, SpaceCategory,
};
use interior::config::PaymentConfig;
use interior::geo::StaticGeocoder;
use interior::notify::RecordingMailer;
use interior::payment::{
    decimal_string, CreatedPayment, CreatedRefund, GatewayError, PaymentGateway, PaymentService,
    PaymentSnapshot, WebhookEvent,
};
use interior::review::ReviewService;
use interior::storage::memory::{
    InMemoryBookingRepository, InMemoryCatalogRepository, InMemoryLedger,
    InMemoryReviewRepository, InMemoryUserRepository,
};

/// Scripted gateway double recording every call.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sequence: AtomicU64,
    pub captures: Mutex<Vec<String>>,
    pub refunds: Mutex<Vec<(String, i64)>>,
    pub find_snapshot: Mutex<Option<PaymentSnapshot>>,
}

impl RecordingGateway {
    fn next_id(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id:04}")
    }

    pub fn capture_count(&self) -> usize {
        self.captures.lock().expect("gateway mutex").len()
    }

    pub fn refund_requests(&self) -> Vec<(String, i64)> {
        self.refunds.lock().expect("gateway mutex").clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create(
        &self,
        amount_minor: i64,
        _booking_id: interior::booking::BookingId,
        _description: &str,
        return_url: &str,
    ) -> Result<CreatedPayment, GatewayError> {
        let id = self.next_id("pay");
        Ok(CreatedPayment {
            confirmation_url: format!("{return_url}?payment={id}"),
            id,
            amount_minor,
        })
    }

    async fn capture(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
        self.captures
            .lock()
            .expect("gateway mutex")
            .push(payment_id.to_string());
        Ok(PaymentSnapshot {
            id: payment_id.to_string(),
            status: "succeeded".to_string(),
            paid: true,
            amount_minor: 0,
        })
    }

    async fn refund(
        &self,
        payment_id: &str,
        amount_minor: i64,
    ) -> Result<CreatedRefund, GatewayError> {
        self.refunds
            .lock()
            .expect("gateway mutex")
            .push((payment_id.to_string(), amount_minor));
        Ok(CreatedRefund {
            id: self.next_id("refund"),
            status: "succeeded".to_string(),
        })
    }

    async fn find(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
        Ok(self
            .find_snapshot
            .lock()
            .expect("gateway mutex")
            .clone()
            .unwrap_or(PaymentSnapshot {
                id: payment_id.to_string(),
                status: "pending".to_string(),
                paid: false,
                amount_minor: 0,
            }))
    }
}

pub type TestCatalog = CatalogService<
    InMemoryCatalogRepository,
    InMemoryReviewRepository,
    InMemoryBookingRepository,
    StaticGeocoder,
>;
pub type TestBookings =
    BookingService<InMemoryBookingRepository, InMemoryCatalogRepository, RecordingMailer>;
pub type TestPayments = PaymentService<
    InMemoryBookingRepository,
    InMemoryLedger,
    RecordingGateway,
    RecordingMailer,
>;
pub type TestReviews =
    ReviewService<InMemoryReviewRepository, InMemoryCatalogRepository, InMemoryBookingRepository>;
pub type TestBackoffice = BackofficeService<
    InMemoryUserRepository,
    InMemoryCatalogRepository,
    InMemoryBookingRepository,
    InMemoryLedger,
    InMemoryReviewRepository,
>;

pub struct World {
    pub users_repo: Arc<InMemoryUserRepository>,
    pub catalog_repo: Arc<InMemoryCatalogRepository>,
    pub bookings_repo: Arc<InMemoryBookingRepository>,
    pub ledger: Arc<InMemoryLedger>,
    pub reviews_repo: Arc<InMemoryReviewRepository>,
    pub catalog: TestCatalog,
    pub bookings: TestBookings,
    pub payments: TestPayments,
    pub reviews: TestReviews,
    pub accounts: AccountService<InMemoryUserRepository>,
    pub backoffice: TestBackoffice,
    pub mailer: Arc<RecordingMailer>,
    pub gateway: Arc<RecordingGateway>,
    pub renter: UserId,
    pub owner: UserId,
    pub loft: ListingId,
    pub studio: ListingId,
    pub hour: RentalPeriodId,
    pub day: RentalPeriodId,
}

/// Build a seeded world: two cities, two categories, hourly/daily periods,
/// an owner and a renter, and two priced listings.
pub async fn world() -> World {
    use interior::catalog::CatalogRepository;

    let users_repo = Arc::new(InMemoryUserRepository::default());
    let catalog_repo = Arc::new(InMemoryCatalogRepository::default());
    let bookings_repo = Arc::new(InMemoryBookingRepository::default());
    let ledger = Arc::new(InMemoryLedger::default());
    let reviews_repo = Arc::new(InMemoryReviewRepository::default());
    let mailer = Arc::new(RecordingMailer::default());
    let gateway = Arc::new(RecordingGateway::default());

    let catalog = CatalogService::new(
        catalog_repo.clone(),
        reviews_repo.clone(),
        bookings_repo.clone(),
        Arc::new(StaticGeocoder::default()),
    );
    let bookings = BookingService::new(
        bookings_repo.clone(),
        catalog_repo.clone(),
        mailer.clone(),
    );
    let payments = PaymentService::new(
        bookings_repo.clone(),
        ledger.clone(),
        gateway.clone(),
        mailer.clone(),
        PaymentConfig::default(),
    );
    let reviews = ReviewService::new(
        reviews_repo.clone(),
        catalog_repo.clone(),
        bookings_repo.clone(),
    );
    let accounts = AccountService::new(users_repo.clone());
    let backoffice = BackofficeService::new(
        users_repo.clone(),
        catalog_repo.clone(),
        bookings_repo.clone(),
        ledger.clone(),
        reviews_repo.clone(),
    );

    for (id, name, region) in [(1, "Moscow", "Moscow"), (2, "Kazan", "Tatarstan")] {
        catalog_repo
            .put_city(City {
                id: CityId(id),
                name: name.to_string(),
                region: region.to_string(),
                is_active: true,
            })
            .expect("seed city");
    }
    for (id, name, slug) in [(1, "Loft", "loft"), (2, "Photo studio", "photo-studio")] {
        catalog_repo
            .put_category(SpaceCategory {
                id: CategoryId(id),
                name: name.to_string(),
                slug: slug.to_string(),
                description: String::new(),
                is_active: true,
            })
            .expect("seed category");
    }
    for (id, code, description, hours, sort) in
        [(1, "hour", "Hourly", 1, 1), (2, "day", "Daily", 24, 2)]
    {
        catalog_repo
            .put_period(RentalPeriod {
                id: RentalPeriodId(id),
                code: code.to_string(),
                description: description.to_string(),
                hours_count: hours,
                sort_order: sort,
            })
            .expect("seed period");
    }

    let owner = accounts
        .register(NewUserAccount {
            username: "owner".to_string(),
            email: "owner@example.com".to_string(),
            phone: String::new(),
            company: "Interior LLC".to_string(),
            role: UserRole::Admin,
        })
        .expect("seed owner");
    let renter = accounts
        .register(NewUserAccount {
            username: "renter".to_string(),
            email: "renter@example.com".to_string(),
            phone: String::new(),
            company: String::new(),
            role: UserRole::User,
        })
        .expect("seed renter");

    let loft = catalog
        .create_listing(NewListing {
            title: "Loft on the Embankment".to_string(),
            address: "Embankment st. 12".to_string(),
            city_id: CityId(1),
            category_id: CategoryId(1),
            area_sqm: 120.0,
            max_capacity: 60,
            description: "Brick walls and tall windows.".to_string(),
            owner_id: owner.id,
            is_featured: true,
        })
        .await
        .expect("seed loft");
    let studio = catalog
        .create_listing(NewListing {
            title: "Daylight Photo Studio".to_string(),
            address: "Garden lane 3".to_string(),
            city_id: CityId(2),
            category_id: CategoryId(2),
            area_sqm: 45.0,
            max_capacity: 8,
            description: "North light and a cyclorama.".to_string(),
            owner_id: owner.id,
            is_featured: false,
        })
        .await
        .expect("seed studio");

    for (listing, period, price, min_p, max_p) in [
        (loft.id, RentalPeriodId(1), 250_000_i64, 1, 24),
        (loft.id, RentalPeriodId(2), 4_000_000, 1, 14),
        (studio.id, RentalPeriodId(1), 150_000, 1, 12),
    ] {
        catalog
            .set_price(ListingPrice {
                listing_id: listing,
                period_id: period,
                price_minor: price,
                is_active: true,
                min_periods: min_p,
                max_periods: max_p,
            })
            .expect("seed price");
    }

    World {
        users_repo,
        catalog_repo,
        bookings_repo,
        ledger,
        reviews_repo,
        catalog,
        bookings,
        payments,
        reviews,
        accounts,
        backoffice,
        mailer,
        gateway,
        renter: renter.id,
        owner: owner.id,
        loft: loft.id,
        studio: studio.id,
        hour: RentalPeriodId(1),
        day: RentalPeriodId(2),
    }
}

impl World {
    /// A pending booking of the loft for `hours` hours starting at `starts_at`.
    pub fn book_loft(&self, starts_at: DateTime<Utc>, hours: u32) -> Booking {
        self.bookings
            .create(BookingRequest {
                listing_id: self.loft,
                tenant_id: self.renter,
                period_id: self.hour,
                starts_at,
                periods_count: hours,
                comment: String::new(),
            })
            .expect("booking created")
    }

    pub fn in_hours(hours: i64) -> DateTime<Utc> {
        Utc::now() + Duration::hours(hours)
    }

    pub fn in_days(days: i64) -> DateTime<Utc> {
        Utc::now() + Duration::days(days)
    }
}

pub fn succeeded_event(payment_id: &str, booking_id: u64, amount_minor: i64) -> WebhookEvent {
    event_json("payment.succeeded", payment_id, Some(booking_id), Some(amount_minor))
}

pub fn waiting_for_capture_event(payment_id: &str, booking_id: u64) -> WebhookEvent {
    event_json("payment.waiting_for_capture", payment_id, Some(booking_id), None)
}

pub fn canceled_event(payment_id: &str, booking_id: u64) -> WebhookEvent {
    event_json("payment.canceled", payment_id, Some(booking_id), None)
}

pub fn refund_event(refund_id: &str, booking_id: u64, amount_minor: i64) -> WebhookEvent {
    event_json("refund.succeeded", refund_id, Some(booking_id), Some(amount_minor))
}

/// A success event whose metadata was stripped by the sender.
pub fn succeeded_event_without_metadata() -> WebhookEvent {
    event_json("payment.succeeded", "pay-anon", None, Some(100_000))
}

/// An event of an arbitrary type the router does not handle.
pub fn named_event(event: &str, object_id: &str, booking_id: u64) -> WebhookEvent {
    event_json(event, object_id, Some(booking_id), None)
}

fn event_json(
    event: &str,
    object_id: &str,
    booking_id: Option<u64>,
    amount_minor: Option<i64>,
) -> WebhookEvent {
    let mut object = serde_json::json!({ "id": object_id, "status": "unspecified" });
    if let Some(booking_id) = booking_id {
        object["metadata"] = serde_json::json!({ "booking_id": booking_id.to_string() });
    }
    if let Some(amount_minor) = amount_minor {
        object["amount"] =
            serde_json::json!({ "value": decimal_string(amount_minor), "currency": "RUB" });
    }

    serde_json::from_value(serde_json::json!({ "event": event, "object": object }))
        .expect("webhook payload is valid")
}
