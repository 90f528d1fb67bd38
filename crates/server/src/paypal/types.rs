//! Request/response types for the PayPal Orders v2 API.
//!
//! Only the fields this storefront reads or writes are modeled; everything
//! else in PayPal's responses is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v2/checkout/orders`.
#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    pub intent: OrderIntent,
    pub purchase_units: Vec<PurchaseUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_context: Option<ApplicationContext>,
}

/// Checkout intent. This storefront always captures immediately.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderIntent {
    #[serde(rename = "CAPTURE")]
    Capture,
    #[serde(rename = "AUTHORIZE")]
    Authorize,
}

/// One purchase unit (this storefront always sends exactly one).
#[derive(Debug, Serialize)]
pub struct PurchaseUnit {
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

/// A money amount as PayPal represents it: decimal string plus currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Amount {
    pub currency_code: String,
    pub value: String,
}

/// Redirect configuration for the approval flow.
#[derive(Debug, Serialize)]
pub struct ApplicationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    pub return_url: String,
    pub cancel_url: String,
    pub user_action: String,
}

/// Response from order creation and retrieval.
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

/// A HATEOAS link in a PayPal response.
#[derive(Debug, Deserialize)]
pub struct LinkDescription {
    pub href: String,
    pub rel: String,
}

impl OrderResponse {
    /// The buyer approval URL, when present.
    #[must_use]
    pub fn approve_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.as_str())
    }
}

/// Response from `POST /v2/checkout/orders/{id}/capture`.
#[derive(Debug, Deserialize)]
pub struct CaptureResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<CapturedPurchaseUnit>,
}

impl CaptureResponse {
    /// Whether the capture fully completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }
}

/// A purchase unit in a capture response.
#[derive(Debug, Deserialize)]
pub struct CapturedPurchaseUnit {
    #[serde(default)]
    pub payments: Option<CapturedPayments>,
}

/// Payments block of a captured purchase unit.
#[derive(Debug, Deserialize)]
pub struct CapturedPayments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

/// One capture of funds.
#[derive(Debug, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
    pub amount: Amount,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_request_shape() {
        let request = CreateOrderRequest {
            intent: OrderIntent::Capture,
            purchase_units: vec![PurchaseUnit {
                amount: Amount {
                    currency_code: "USD".to_string(),
                    value: "59.98".to_string(),
                },
                reference_id: None,
            }],
            application_context: Some(ApplicationContext {
                brand_name: Some("Telar".to_string()),
                return_url: "https://tienda.telar.cl/checkout/success".to_string(),
                cancel_url: "https://tienda.telar.cl/checkout/cancel".to_string(),
                user_action: "PAY_NOW".to_string(),
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["intent"], "CAPTURE");
        assert_eq!(json["purchase_units"][0]["amount"]["value"], "59.98");
        assert_eq!(
            json["application_context"]["user_action"],
            "PAY_NOW"
        );
        // Absent optionals are omitted entirely
        assert!(json["purchase_units"][0].get("reference_id").is_none());
    }

    #[test]
    fn test_order_response_approve_url() {
        let body = r#"{
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                {"href": "https://api-m.sandbox.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self"},
                {"href": "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve"}
            ]
        }"#;

        let response: OrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, "CREATED");
        assert_eq!(
            response.approve_url(),
            Some("https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T")
        );
    }

    #[test]
    fn test_capture_response_completed() {
        let body = r#"{
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": {
                    "captures": [{"id": "3C679366HH908993F", "status": "COMPLETED",
                                  "amount": {"currency_code": "USD", "value": "59.98"}}]
                }
            }]
        }"#;

        let response: CaptureResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_completed());
        let capture = &response.purchase_units[0]
            .payments
            .as_ref()
            .unwrap()
            .captures[0];
        assert_eq!(capture.amount.value, "59.98");
    }
}
