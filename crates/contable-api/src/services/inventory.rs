//! Products and stock: `/pos/productos/`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{ApiClient, Page};
use crate::error::{ApiError, ApiResult};
use crate::resource::Resource;

pub const PATH: &str = "pos/productos/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub tax_rate: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Stock of one product, per warehouse when the server tracks several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: i64,
    pub quantity: String,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub minimum: Option<String>,
}

/// A manual correction. Positive adds, negative removes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub quantity: i64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct InventoryService {
    products: Resource<Product>,
}

impl InventoryService {
    pub fn new(client: ApiClient) -> Self {
        InventoryService {
            products: Resource::new(client, PATH),
        }
    }

    pub async fn list(&self, filter: &ProductFilter) -> ApiResult<Page<Product>> {
        self.products.list(filter).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Product> {
        self.products.get(id).await
    }

    pub async fn stock(&self, product_id: i64) -> ApiResult<StockLevel> {
        let path = self.products.action_path(product_id, "stock");
        self.products.client().get(&path).await
    }

    pub async fn adjust_stock(
        &self,
        product_id: i64,
        adjustment: &StockAdjustment,
    ) -> ApiResult<StockLevel> {
        if adjustment.quantity == 0 {
            return Err(ApiError::Validation {
                message: "The adjustment quantity cannot be zero".to_string(),
                fields: [("quantity".to_string(), vec!["Must not be zero.".to_string()])].into(),
            });
        }
        if adjustment.reason.trim().is_empty() {
            return Err(ApiError::Validation {
                message: "A reason is required for stock adjustments".to_string(),
                fields: [("reason".to_string(), vec!["Required.".to_string()])].into(),
            });
        }

        let level: StockLevel = self
            .products
            .action(product_id, "ajustar_stock", adjustment)
            .await?;
        info!(
            product_id,
            delta = adjustment.quantity,
            quantity = %level.quantity,
            "Stock adjusted"
        );
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::signed_in_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_stock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pos/productos/3/stock/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "product_id": 3, "quantity": "42", "minimum": "10"
            })))
            .mount(&server)
            .await;

        let level = signed_in_client(&server).inventory().stock(3).await.unwrap();
        assert_eq!(level.quantity, "42");
        assert_eq!(level.minimum.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pos/productos/3/ajustar_stock/"))
            .and(body_json(json!({"quantity": -2, "reason": "Merma"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "product_id": 3, "quantity": "40"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let level = signed_in_client(&server)
            .inventory()
            .adjust_stock(
                3,
                &StockAdjustment {
                    quantity: -2,
                    reason: "Merma".into(),
                    warehouse: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(level.quantity, "40");
    }

    #[tokio::test]
    async fn test_zero_adjustment_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = signed_in_client(&server)
            .inventory()
            .adjust_stock(
                3,
                &StockAdjustment {
                    quantity: 0,
                    reason: "Conteo".into(),
                    warehouse: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }
}
