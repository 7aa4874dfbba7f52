use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use interior::accounts::{AccountService, NewUserAccount, UserId, UserRole};
use interior::backoffice::BackofficeService;
use interior::booking::{BookingId, BookingService};
use interior::catalog::{
    CatalogService, CategoryId, City, CityId, ListingId, ListingPrice, NewListing,
    NewListingImage, RentalPeriod, RentalPeriodId, SpaceCategory,
};
use interior::config::AppConfig;
use interior::geo::GeoClient;
use interior::notify::TracingMailer;
use interior::payment::{
    CreatedPayment, CreatedRefund, GatewayError, HostedCheckoutClient, PaymentGateway,
    PaymentService, PaymentSnapshot,
};
use interior::review::ReviewService;
use interior::storage::memory::{
    InMemoryBookingRepository, InMemoryCatalogRepository, InMemoryLedger,
    InMemoryReviewRepository, InMemoryUserRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Catalog = CatalogService<
    InMemoryCatalogRepository,
    InMemoryReviewRepository,
    InMemoryBookingRepository,
    GeoClient,
>;
pub(crate) type Bookings =
    BookingService<InMemoryBookingRepository, InMemoryCatalogRepository, TracingMailer>;
pub(crate) type Payments = PaymentService<
    InMemoryBookingRepository,
    InMemoryLedger,
    HostedCheckoutClient,
    TracingMailer,
>;
pub(crate) type Reviews =
    ReviewService<InMemoryReviewRepository, InMemoryCatalogRepository, InMemoryBookingRepository>;
pub(crate) type Accounts = AccountService<InMemoryUserRepository>;
pub(crate) type Backoffice = BackofficeService<
    InMemoryUserRepository,
    InMemoryCatalogRepository,
    InMemoryBookingRepository,
    InMemoryLedger,
    InMemoryReviewRepository,
>;

/// The repository suite behind one running service instance.
#[derive(Clone, Default)]
pub(crate) struct Repositories {
    pub(crate) users: Arc<InMemoryUserRepository>,
    pub(crate) catalog: Arc<InMemoryCatalogRepository>,
    pub(crate) bookings: Arc<InMemoryBookingRepository>,
    pub(crate) ledger: Arc<InMemoryLedger>,
    pub(crate) reviews: Arc<InMemoryReviewRepository>,
}

/// Every wired service, shared as router state.
#[derive(Clone)]
pub(crate) struct AppServices {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) bookings: Arc<Bookings>,
    pub(crate) payments: Arc<Payments>,
    pub(crate) reviews: Arc<Reviews>,
    pub(crate) accounts: Arc<Accounts>,
    pub(crate) backoffice: Arc<Backoffice>,
    pub(crate) backup_dir: PathBuf,
}

pub(crate) fn build_services(config: &AppConfig, repos: &Repositories) -> AppServices {
    let mailer = Arc::new(TracingMailer);
    let geocoder = Arc::new(GeoClient::from_config(&config.geo));
    let gateway = Arc::new(HostedCheckoutClient::from_config(&config.payment));

    AppServices {
        catalog: Arc::new(CatalogService::new(
            repos.catalog.clone(),
            repos.reviews.clone(),
            repos.bookings.clone(),
            geocoder,
        )),
        bookings: Arc::new(BookingService::new(
            repos.bookings.clone(),
            repos.catalog.clone(),
            mailer.clone(),
        )),
        payments: Arc::new(PaymentService::new(
            repos.bookings.clone(),
            repos.ledger.clone(),
            gateway,
            mailer,
            config.payment.clone(),
        )),
        reviews: Arc::new(ReviewService::new(
            repos.reviews.clone(),
            repos.catalog.clone(),
            repos.bookings.clone(),
        )),
        accounts: Arc::new(AccountService::new(repos.users.clone())),
        backoffice: Arc::new(BackofficeService::new(
            repos.users.clone(),
            repos.catalog.clone(),
            repos.bookings.clone(),
            repos.ledger.clone(),
            repos.reviews.clone(),
        )),
        backup_dir: config.backup.dir.clone(),
    }
}

/// The fixed rental-period vocabulary every deployment starts with.
pub(crate) fn seed_rental_periods(catalog: &InMemoryCatalogRepository) {
    use interior::catalog::CatalogRepository;

    let periods = [
        (1, "hour", "Hourly", 1, 1),
        (2, "day", "Daily", 24, 2),
        (3, "week", "Weekly", 168, 3),
        (4, "month", "Monthly", 720, 4),
    ];
    for (id, code, description, hours_count, sort_order) in periods {
        catalog
            .put_period(RentalPeriod {
                id: RentalPeriodId(id),
                code: code.to_string(),
                description: description.to_string(),
                hours_count,
                sort_order,
            })
            .expect("seed period");
    }
}

/// Ids handed back by the demo seed so callers can drive a full flow.
pub(crate) struct SeedHandles {
    pub(crate) renter: UserId,
    pub(crate) owner: UserId,
    pub(crate) loft: ListingId,
    pub(crate) studio: ListingId,
    pub(crate) hour_period: RentalPeriodId,
}

/// Populate cities, categories, users, listings, prices, and images with a
/// small demo data set.
pub(crate) async fn seed_demo_world(repos: &Repositories, services: &AppServices) -> SeedHandles {
    use interior::catalog::CatalogRepository;

    seed_rental_periods(&repos.catalog);

    for (id, name, region) in [
        (1, "Moscow", "Moscow"),
        (2, "Saint Petersburg", "Leningrad Oblast"),
    ] {
        repos
            .catalog
            .put_city(City {
                id: CityId(id),
                name: name.to_string(),
                region: region.to_string(),
                is_active: true,
            })
            .expect("seed city");
    }

    for (id, name, slug, description) in [
        (1, "Loft", "loft", "Open industrial spaces for events"),
        (2, "Photo studio", "photo-studio", "Equipped studios with light"),
        (3, "Office", "office", "Meeting rooms and offices"),
    ] {
        repos
            .catalog
            .put_category(SpaceCategory {
                id: CategoryId(id),
                name: name.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
                is_active: true,
            })
            .expect("seed category");
    }

    let owner = services
        .accounts
        .register(NewUserAccount {
            username: "space_owner".to_string(),
            email: "owner@example.com".to_string(),
            phone: "8 912 345 67 89".to_string(),
            company: "Interior LLC".to_string(),
            role: UserRole::Admin,
        })
        .expect("seed owner");
    let renter = services
        .accounts
        .register(NewUserAccount {
            username: "first_renter".to_string(),
            email: "renter@example.com".to_string(),
            phone: String::new(),
            company: String::new(),
            role: UserRole::User,
        })
        .expect("seed renter");

    let loft = services
        .catalog
        .create_listing(NewListing {
            title: "Loft on the Embankment".to_string(),
            address: "Embankment st. 12".to_string(),
            city_id: CityId(1),
            category_id: CategoryId(1),
            area_sqm: 120.0,
            max_capacity: 60,
            description: "Brick walls, tall windows, river view.".to_string(),
            owner_id: owner.id,
            is_featured: true,
        })
        .await
        .expect("seed loft");
    let studio = services
        .catalog
        .create_listing(NewListing {
            title: "Daylight Photo Studio".to_string(),
            address: "Garden lane 3".to_string(),
            city_id: CityId(2),
            category_id: CategoryId(2),
            area_sqm: 45.5,
            max_capacity: 8,
            description: "North-facing windows and a cyclorama.".to_string(),
            owner_id: owner.id,
            is_featured: false,
        })
        .await
        .expect("seed studio");

    for (listing, period, price_minor, min_periods, max_periods) in [
        (loft.id, RentalPeriodId(1), 250_000_i64, 2, 12),
        (loft.id, RentalPeriodId(2), 4_000_000, 1, 14),
        (studio.id, RentalPeriodId(1), 150_000, 1, 10),
    ] {
        services
            .catalog
            .set_price(ListingPrice {
                listing_id: listing,
                period_id: period,
                price_minor,
                is_active: true,
                min_periods,
                max_periods,
            })
            .expect("seed price");
    }

    services
        .catalog
        .add_image(NewListingImage {
            listing_id: loft.id,
            alt_text: "Main hall".to_string(),
            is_primary: true,
            sort_order: 0,
        })
        .expect("seed image");

    SeedHandles {
        renter: renter.id,
        owner: owner.id,
        loft: loft.id,
        studio: studio.id,
        hour_period: RentalPeriodId(1),
    }
}

/// Always-succeeding gateway used by the CLI demo: charges settle instantly
/// and refunds are accepted without a provider round trip.
#[derive(Debug, Default)]
pub(crate) struct SandboxGateway {
    sequence: AtomicU64,
}

impl SandboxGateway {
    fn next_id(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id:04}")
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create(
        &self,
        amount_minor: i64,
        booking_id: BookingId,
        _description: &str,
        return_url: &str,
    ) -> Result<CreatedPayment, GatewayError> {
        let id = self.next_id("sandbox-pay");
        Ok(CreatedPayment {
            confirmation_url: format!("{return_url}?payment={id}&booking={}", booking_id.0),
            id,
            amount_minor,
        })
    }

    async fn capture(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
        Ok(PaymentSnapshot {
            id: payment_id.to_string(),
            status: "succeeded".to_string(),
            paid: true,
            amount_minor: 0,
        })
    }

    async fn refund(
        &self,
        _payment_id: &str,
        _amount_minor: i64,
    ) -> Result<CreatedRefund, GatewayError> {
        Ok(CreatedRefund {
            id: self.next_id("sandbox-refund"),
            status: "succeeded".to_string(),
        })
    }

    async fn find(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
        Ok(PaymentSnapshot {
            id: payment_id.to_string(),
            status: "pending".to_string(),
            paid: false,
            amount_minor: 0,
        })
    }
}
