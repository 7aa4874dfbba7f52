use serde::{Deserialize, Deserializer, Serialize};

use super::domain::minor_from_decimal;

pub const EVENT_WAITING_FOR_CAPTURE: &str = "payment.waiting_for_capture";
pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment.succeeded";
pub const EVENT_PAYMENT_CANCELED: &str = "payment.canceled";
pub const EVENT_REFUND_SUCCEEDED: &str = "refund.succeeded";

/// Inbound provider notification: an event name plus the payment or refund
/// object it describes.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(rename = "object")]
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub amount: Option<WebhookAmount>,
    #[serde(default)]
    pub metadata: WebhookMetadata,
    /// Refund events reference the captured payment they reverse.
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookAmount {
    pub value: String,
    #[serde(default)]
    pub currency: String,
}

/// Metadata echoes whatever the charge was created with; the provider
/// delivers the values as strings, so ids accept both forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMetadata {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub booking_id: Option<u64>,
}

impl WebhookEvent {
    pub fn amount_minor(&self) -> Option<i64> {
        self.object
            .amount
            .as_ref()
            .and_then(|amount| minor_from_decimal(&amount.value))
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawId::Number(id)) => Some(id),
        Some(RawId::Text(text)) => text.trim().parse::<u64>().ok(),
    })
}

/// What processing an event actually did; replays map to `AlreadyProcessed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Captured,
    PrepaymentRecorded,
    PaymentCancelled,
    RefundRecorded,
    AlreadyProcessed,
    Ignored,
}
