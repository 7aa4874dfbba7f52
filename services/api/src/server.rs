use crate::cli::ServeArgs;
use crate::infra::{build_services, seed_demo_world, seed_rental_periods, AppState, Repositories};
use crate::routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use interior::config::{AppConfig, AppEnvironment};
use interior::error::AppError;
use interior::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repos = Repositories::default();
    let services = build_services(&config, &repos);

    // Production starts with the period vocabulary only; other stages get a
    // browsable demo data set so the API is usable out of the box.
    if config.environment == AppEnvironment::Production {
        seed_rental_periods(&repos.catalog);
    } else {
        seed_demo_world(&repos, &services).await;
    }

    let app = routes::router(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rental marketplace api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
