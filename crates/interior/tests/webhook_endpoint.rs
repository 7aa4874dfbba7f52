//! HTTP specifications for the payment router: status codes, webhook
//! replies, and the non-2xx contract that makes the provider redeliver.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::World;
use interior::payment::payment_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("serialize")))
        .expect("request")
}

#[tokio::test]
async fn webhook_round_trip_reports_actions() {
    let world = common::world().await;
    let booking = world.book_loft(World::in_days(3), 4);
    let created = world.payments.initiate(booking.id, None).await.expect("pay");
    let router = payment_router(Arc::new(world.payments));

    let event = json!({
        "event": "payment.succeeded",
        "object": {
            "id": created.id,
            "status": "succeeded",
            "paid": true,
            "amount": { "value": "1000.00", "currency": "RUB" },
            "metadata": { "booking_id": booking.id.0.to_string() },
        }
    });

    let response = router
        .clone()
        .oneshot(post_json("/webhooks/payment", &event))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["action"], "prepayment_recorded");

    // Redelivery answers 200 with the replay action and no new side effects.
    let response = router
        .clone()
        .oneshot(post_json("/webhooks/payment", &event))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["action"], "already_processed");
}

#[tokio::test]
async fn webhook_failures_answer_non_2xx_for_redelivery() {
    let world = common::world().await;
    let router = payment_router(Arc::new(world.payments));

    // Metadata without a booking id cannot be routed.
    let event = json!({
        "event": "payment.succeeded",
        "object": { "id": "pay-anon", "status": "succeeded" }
    });
    let response = router
        .clone()
        .oneshot(post_json("/webhooks/payment", &event))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A booking the service has never seen is a routing failure too.
    let event = json!({
        "event": "payment.succeeded",
        "object": {
            "id": "pay-ghost",
            "status": "succeeded",
            "metadata": { "booking_id": "424242" },
        }
    });
    let response = router
        .oneshot(post_json("/webhooks/payment", &event))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unhandled_event_types_are_acknowledged() {
    let world = common::world().await;
    let booking = world.book_loft(World::in_days(3), 2);
    let router = payment_router(Arc::new(world.payments));

    let event = json!({
        "event": "deal.closed",
        "object": {
            "id": "deal-1",
            "metadata": { "booking_id": booking.id.0.to_string() },
        }
    });
    let response = router
        .oneshot(post_json("/webhooks/payment", &event))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["action"], "ignored");
}

#[tokio::test]
async fn initiate_endpoint_returns_the_confirmation_url() {
    let world = common::world().await;
    let booking = world.book_loft(World::in_days(3), 4);
    let router = payment_router(Arc::new(world.payments));

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/bookings/{}/payment", booking.id.0),
            &json!({ "return_url": "https://interior.example/return" }),
        ))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = body_json(response).await;
    assert_eq!(payload["amount_minor"], 100_000);
    assert!(payload["confirmation_url"]
        .as_str()
        .expect("url")
        .starts_with("https://interior.example/return"));

    // A second initiation for the same booking is fine while unpaid; the
    // unknown-booking case is a 404.
    let response = router
        .oneshot(post_json("/api/v1/bookings/999/payment", &json!({})))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn penalty_endpoint_spells_out_the_rule() {
    let world = common::world().await;
    let booking = world.book_loft(World::in_hours(10), 2);
    let created = world.payments.initiate(booking.id, None).await.expect("pay");
    world
        .payments
        .process_webhook(common::succeeded_event(&created.id, booking.id.0, 50_000))
        .await
        .expect("paid");
    let router = payment_router(Arc::new(world.payments));

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/bookings/{}/penalty", booking.id.0))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["has_penalty"], true);
    assert_eq!(payload["penalty_minor"], 50_000);
    assert!(payload["message"]
        .as_str()
        .expect("message")
        .contains("forfeits"));
}
