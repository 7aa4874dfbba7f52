use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Args;
use interior::booking::BookingRequest;
use interior::catalog::{SearchFilter, SortOrder};
use interior::config::AppConfig;
use interior::error::AppError;
use interior::notify::RecordingMailer;
use interior::payment::{decimal_string, PaymentService, WebhookEvent};
use interior::storage::memory::{InMemoryBookingRepository, InMemoryLedger};

use crate::infra::{build_services, seed_demo_world, Repositories, SandboxGateway};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of rental periods for the demo booking
    #[arg(long)]
    pub(crate) periods_count: Option<u32>,
    /// Skip the late-cancellation (forfeited prepayment) portion
    #[arg(long)]
    pub(crate) skip_cancellation: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BackupArgs {
    /// Directory to write the dump into (defaults to BACKUP_DIR)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

type DemoPayments = PaymentService<
    InMemoryBookingRepository,
    InMemoryLedger,
    SandboxGateway,
    RecordingMailer,
>;

fn succeeded_event(payment_id: &str, booking_id: u64, amount_minor: i64) -> WebhookEvent {
    serde_json::from_value(serde_json::json!({
        "event": "payment.succeeded",
        "object": {
            "id": payment_id,
            "status": "succeeded",
            "paid": true,
            "amount": { "value": decimal_string(amount_minor), "currency": "RUB" },
            "metadata": { "booking_id": booking_id.to_string() },
        }
    }))
    .expect("demo webhook payload is valid")
}

/// End-to-end walkthrough: seed the catalog, search it, book a space,
/// collect the prepayment through a sandbox gateway, replay the webhook to
/// show idempotence, and run both cancellation outcomes.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let repos = Repositories::default();
    let services = build_services(&config, &repos);
    let handles = seed_demo_world(&repos, &services).await;

    let mailer = Arc::new(RecordingMailer::default());
    let payments: DemoPayments = PaymentService::new(
        repos.bookings.clone(),
        repos.ledger.clone(),
        Arc::new(SandboxGateway::default()),
        mailer.clone(),
        config.payment.clone(),
    );

    println!("=== Catalog search ===");
    let filter = SearchFilter {
        search: Some("loft".to_string()),
        sort: SortOrder::PriceAsc,
        ..SearchFilter::default()
    };
    let page = services.catalog.search(&filter)?;
    println!("{} listing(s) match 'loft':", page.total);
    for summary in &page.items {
        println!(
            "  #{} {} ({}, {}) from {}",
            summary.id.0,
            summary.title,
            summary.city,
            summary.category,
            summary
                .min_price_minor
                .map(decimal_string)
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    println!("\n=== Booking ===");
    let periods_count = args.periods_count.unwrap_or(4);
    let quote = services
        .bookings
        .quote(handles.loft, handles.hour_period, periods_count)?;
    println!(
        "Quote: {} x {} = {} ({} hours)",
        decimal_string(quote.price_per_period_minor),
        periods_count,
        decimal_string(quote.total_minor),
        quote.total_hours,
    );

    let booking = services.bookings.create(BookingRequest {
        listing_id: handles.loft,
        tenant_id: handles.renter,
        period_id: handles.hour_period,
        starts_at: Utc::now() + Duration::days(3),
        periods_count,
        comment: "Team offsite".to_string(),
    })?;
    let booking = services.bookings.confirm(booking.id)?;
    println!(
        "Booking #{} confirmed, total {}",
        booking.id.0,
        decimal_string(booking.total_amount_minor)
    );

    println!("\n=== Prepayment ===");
    let created = payments.initiate(booking.id, None).await?;
    println!(
        "Checkout created: {} for {} -> {}",
        created.id,
        decimal_string(created.amount_minor),
        created.confirmation_url
    );

    let event = succeeded_event(&created.id, booking.id.0, created.amount_minor);
    let outcome = payments.process_webhook(event.clone()).await?;
    println!("Webhook delivered: {outcome:?}");
    let replay = payments.process_webhook(event).await?;
    println!("Webhook redelivered: {replay:?} (ledger unchanged)");
    println!("Mailer deliveries: {}", mailer.deliveries().len());

    if !args.skip_cancellation {
        println!("\n=== Cancellation outcomes ===");

        // Early cancellation: outside the lead window, the prepayment comes
        // back through a provider refund.
        let refund = payments
            .process_cancellation_refund(booking.id, Utc::now())
            .await?;
        println!("Early cancellation: {refund:?}");
        services.bookings.cancel(booking.id)?;

        // Late cancellation: a paid booking starting inside the lead window
        // forfeits its prepayment.
        let late = services.bookings.create(BookingRequest {
            listing_id: handles.studio,
            tenant_id: handles.renter,
            period_id: handles.hour_period,
            starts_at: Utc::now() + Duration::hours(10),
            periods_count: 2,
            comment: String::new(),
        })?;
        let late_payment = payments.initiate(late.id, None).await?;
        let late_event = succeeded_event(&late_payment.id, late.id.0, late_payment.amount_minor);
        payments.process_webhook(late_event).await?;
        let forfeit = payments
            .process_cancellation_refund(late.id, Utc::now())
            .await?;
        println!("Late cancellation: {forfeit:?}");
        services.bookings.cancel(late.id)?;
    }

    println!("\n=== Back office ===");
    let overview = services.backoffice.overview()?;
    println!(
        "Bookings: {} total / {} cancelled; prepayments net {}",
        overview.bookings.total,
        overview.bookings.cancelled,
        decimal_string(overview.revenue.prepayments_minor),
    );
    let rows = services.backoffice.booking_report()?;
    println!("Report rows: {}", rows.len());
    let owner = services.backoffice.owner_stats(handles.owner)?;
    println!(
        "Owner stats: {} listing(s), {} booking(s), completed revenue {}",
        owner.listings,
        owner.bookings,
        decimal_string(owner.completed_revenue_minor),
    );

    Ok(())
}

/// Seed the demo data set and write a dump file, exercising the same
/// backup path the admin endpoint uses.
pub(crate) async fn run_backup(args: BackupArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let repos = Repositories::default();
    let services = build_services(&config, &repos);
    seed_demo_world(&repos, &services).await;

    let dir = args.out.unwrap_or(config.backup.dir);
    let report = services.backoffice.write_backup(&dir)?;
    println!(
        "Backup written to {} ({} bytes): {} users, {} listings, {} bookings, {} reviews",
        report.path.display(),
        report.bytes,
        report.users,
        report.listings,
        report.bookings,
        report.reviews,
    );
    Ok(())
}
