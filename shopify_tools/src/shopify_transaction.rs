use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyTransaction {
    pub id: u64,
    pub order_id: u64,
    pub amount: String,
    pub currency: String,
    pub kind: String,
    pub status: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub test: bool,
}

/// Request body for `POST /orders/{id}/transactions.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShopifyTransaction {
    pub kind: String,
    pub status: String,
    pub amount: String,
    pub currency: String,
    pub gateway: String,
}

impl NewShopifyTransaction {
    /// A successful sale, which moves a pending order to `paid`.
    pub fn sale(amount: &str, currency: &str, gateway: &str) -> Self {
        Self {
            kind: "sale".to_string(),
            status: "success".to_string(),
            amount: amount.to_string(),
            currency: currency.to_string(),
            gateway: gateway.to_string(),
        }
    }
}
