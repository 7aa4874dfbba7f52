use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::domain::{decimal_string, minor_from_decimal};
use crate::booking::BookingId;
use crate::config::PaymentConfig;

/// A freshly created hosted-checkout payment.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPayment {
    pub id: String,
    pub confirmation_url: String,
    pub amount_minor: i64,
}

/// Point-in-time view of a payment at the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSnapshot {
    pub id: String,
    pub status: String,
    pub paid: bool,
    pub amount_minor: i64,
}

/// A refund accepted by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRefund {
    pub id: String,
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,
    #[error("gateway transport failure: {0}")]
    Transport(String),
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// The hosted-checkout provider as seen by the domain: create a charge,
/// capture a hold, refund, and query status.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create(
        &self,
        amount_minor: i64,
        booking_id: BookingId,
        description: &str,
        return_url: &str,
    ) -> Result<CreatedPayment, GatewayError>;
    async fn capture(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError>;
    async fn refund(
        &self,
        payment_id: &str,
        amount_minor: i64,
    ) -> Result<CreatedRefund, GatewayError>;
    async fn find(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError>;
}

/// HTTP client for the provider's REST API.
///
/// Requests authenticate with shop-id/secret basic auth and carry a fresh
/// UUID idempotence key, so a timed-out call can be retried safely. Missing
/// credentials turn every call into `NotConfigured` without touching the
/// network.
pub struct HostedCheckoutClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl HostedCheckoutClient {
    pub fn from_config(config: &PaymentConfig) -> Self {
        let credentials = match (&config.shop_id, &config.secret_key) {
            (Some(shop_id), Some(secret_key)) => Some((shop_id.clone(), secret_key.clone())),
            _ => None,
        };

        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn credentials(&self) -> Result<&(String, String), GatewayError> {
        self.credentials.as_ref().ok_or(GatewayError::NotConfigured)
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let (shop_id, secret_key) = self.credentials()?;
        let idempotence_key = Uuid::new_v4().to_string();
        debug!(path, key = %idempotence_key, "gateway request");

        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .basic_auth(shop_id, Some(secret_key))
            .header("Idempotence-Key", idempotence_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;

        if !status.is_success() {
            let detail = payload
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no detail");
            return Err(GatewayError::Rejected(format!("{status}: {detail}")));
        }

        Ok(payload)
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value, GatewayError> {
        let (shop_id, secret_key) = self.credentials()?;

        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .basic_auth(shop_id, Some(secret_key))
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Rejected(status.to_string()));
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiPayment {
    id: String,
    status: String,
    #[serde(default)]
    paid: bool,
    amount: Option<ApiAmount>,
    confirmation: Option<ApiConfirmation>,
}

#[derive(Debug, Deserialize)]
struct ApiAmount {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiConfirmation {
    confirmation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRefund {
    id: String,
    status: String,
}

fn snapshot_from(payload: serde_json::Value) -> Result<PaymentSnapshot, GatewayError> {
    let payment: ApiPayment = serde_json::from_value(payload)
        .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
    let amount_minor = payment
        .amount
        .as_ref()
        .and_then(|amount| minor_from_decimal(&amount.value))
        .unwrap_or(0);

    Ok(PaymentSnapshot {
        id: payment.id,
        status: payment.status,
        paid: payment.paid,
        amount_minor,
    })
}

#[async_trait]
impl PaymentGateway for HostedCheckoutClient {
    async fn create(
        &self,
        amount_minor: i64,
        booking_id: BookingId,
        description: &str,
        return_url: &str,
    ) -> Result<CreatedPayment, GatewayError> {
        let body = json!({
            "amount": { "value": decimal_string(amount_minor), "currency": "RUB" },
            "confirmation": { "type": "redirect", "return_url": return_url },
            // Two-stage capture collapsed to one stage: the provider settles
            // the charge as soon as the customer authorizes it.
            "capture": true,
            "description": description,
            "metadata": { "booking_id": booking_id.0 },
        });

        let payload = self.post("/payments", body).await?;
        let payment: ApiPayment = serde_json::from_value(payload)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        let confirmation_url = payment
            .confirmation
            .and_then(|confirmation| confirmation.confirmation_url)
            .ok_or_else(|| {
                GatewayError::InvalidResponse("missing confirmation url".to_string())
            })?;

        Ok(CreatedPayment {
            id: payment.id,
            confirmation_url,
            amount_minor,
        })
    }

    async fn capture(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
        let payload = self
            .post(&format!("/payments/{payment_id}/capture"), json!({}))
            .await?;
        snapshot_from(payload)
    }

    async fn refund(
        &self,
        payment_id: &str,
        amount_minor: i64,
    ) -> Result<CreatedRefund, GatewayError> {
        let body = json!({
            "payment_id": payment_id,
            "amount": { "value": decimal_string(amount_minor), "currency": "RUB" },
        });

        let payload = self.post("/refunds", body).await?;
        let refund: ApiRefund = serde_json::from_value(payload)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(CreatedRefund {
            id: refund.id,
            status: refund.status,
        })
    }

    async fn find(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
        let payload = self.get(&format!("/payments/{payment_id}")).await?;
        snapshot_from(payload)
    }
}
