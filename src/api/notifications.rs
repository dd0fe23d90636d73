//! Order events pushed to an external webhook (front desk display, SMS
//! gateway). Delivery is best effort and never blocks the request.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::PaymentStatus;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    StatusChanged {
        order_id: i32,
        order_code: String,
        status_id: i32,
    },
    PaymentRegistered {
        order_id: i32,
        amount: Decimal,
        balance: Decimal,
        payment_status: PaymentStatus,
    },
    BookingTransferred {
        reservation_code: String,
        order_id: i32,
        order_code: String,
    },
}

#[derive(Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(client: Client, webhook_url: Option<String>) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post `event` on a background task. A no-op without a webhook URL.
    pub fn notify(&self, event: OrderEvent) {
        let Some(url) = self.webhook_url.clone() else {
            return;
        };
        let client = self.client.clone();

        tokio::spawn(async move {
            let result = client
                .post(&url)
                .json(&event)
                .send()
                .await
                .and_then(|res| res.error_for_status());

            if let Err(err) = result {
                tracing::warn!(?event, "Failed to deliver order event: {err}");
            }
        });
    }
}
