mod admin;
mod bookings;
mod catalog;
mod reviews;

use crate::infra::{AppServices, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use interior::payment::payment_router;
use serde_json::json;

/// Assemble the full HTTP surface: operational endpoints, the domain payment
/// router, and the catalog/booking/review/admin routes.
pub(crate) fn router(services: AppServices) -> Router {
    let payments = payment_router(services.payments.clone());

    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(catalog::router())
        .merge(bookings::router())
        .merge(reviews::router())
        .merge(admin::router())
        .with_state(services)
        .merge(payments)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_services, seed_demo_world, Repositories};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use interior::config::{
        AppConfig, AppEnvironment, BackupConfig, GeoConfig, PaymentConfig, ServerConfig,
        TelemetryConfig,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
            },
            payment: PaymentConfig::default(),
            geo: GeoConfig::default(),
            backup: BackupConfig::default(),
        }
    }

    async fn test_router() -> (Router, crate::infra::SeedHandles) {
        let config = test_config();
        let repos = Repositories::default();
        let services = build_services(&config, &repos);
        let handles = seed_demo_world(&repos, &services).await;
        (router(services), handles)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_answers_ok() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn listings_search_returns_the_seeded_loft() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/listings?search=loft&sort=price_asc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["total"], 1);
        assert_eq!(payload["items"][0]["city"], "Moscow");
        assert!(payload["items"][0]["min_price_minor"].is_number());
    }

    #[tokio::test]
    async fn booking_create_and_conflict_over_http() {
        let (router, handles) = test_router().await;
        let starts_at = chrono::Utc::now() + chrono::Duration::days(5);
        let request_body = json!({
            "listing_id": handles.loft.0,
            "tenant_id": handles.renter.0,
            "period_id": handles.hour_period.0,
            "starts_at": starts_at.to_rfc3339(),
            "periods_count": 3,
            "comment": "Workshop",
        });

        let post = |body: Value| {
            Request::builder()
                .method("POST")
                .uri("/api/v1/bookings")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
                .expect("request")
        };

        let response = router
            .clone()
            .oneshot(post(request_body.clone()))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "pending");
        assert_eq!(created["total_amount_minor"], 750_000);

        let response = router
            .oneshot(post(request_body))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn admin_overview_counts_the_seed() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/overview")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["listings"]["total"], 2);
        assert_eq!(payload["users"]["total"], 2);
    }

    #[tokio::test]
    async fn csv_report_downloads_with_headers() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/reports/bookings?format=csv")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/csv"));
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("bookings-report.csv"));
    }

    #[tokio::test]
    async fn payment_without_credentials_answers_503() {
        let (router, handles) = test_router().await;
        let starts_at = chrono::Utc::now() + chrono::Duration::days(5);
        let create = json!({
            "listing_id": handles.loft.0,
            "tenant_id": handles.renter.0,
            "period_id": handles.hour_period.0,
            "starts_at": starts_at.to_rfc3339(),
            "periods_count": 2,
        });
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/bookings")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&create).expect("serialize")))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        let booking = body_json(response).await;

        // The test environment carries no shop credentials, so checkout
        // creation degrades to a service-unavailable answer.
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/bookings/{}/payment", booking["id"]))
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
