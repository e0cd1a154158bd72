//! Point-of-sale sales: `/pos/ventas/`.
//!
//! `create_sale` is the call the offline queue replays. The payload is passed
//! through untouched; the server is the authority on what a sale looks like.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{ApiClient, Download, Page, NO_QUERY};
use crate::error::ApiResult;
use crate::resource::Resource;

pub const PATH: &str = "pos/ventas/";

/// What the server answers for a created sale.
///
/// Backend versions disagree on the shape (numeric or text ids and folios,
/// sometimes no body at all), so both fields are read best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedSale {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub folio: Option<String>,
}

impl CreatedSale {
    /// Never fails: anything unrecognised is simply absent.
    pub fn from_body(body: &Value) -> Self {
        CreatedSale {
            id: body.get("id").cloned().unwrap_or(Value::Null),
            folio: body.get("folio").and_then(scalar_text),
        }
    }

    /// Server id as text, if the server sent one.
    pub fn remote_id(&self) -> Option<String> {
        scalar_text(&self.id)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    #[serde(default)]
    pub folio: Option<String>,
    pub total: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cashier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SaleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PosService {
    sales: Resource<Sale>,
}

impl PosService {
    pub fn new(client: ApiClient) -> Self {
        PosService {
            sales: Resource::new(client, PATH),
        }
    }

    /// Creates a sale. With a key, the request carries `Idempotency-Key`.
    ///
    /// Any 2xx is a success whatever the body holds; an odd body only
    /// means no remote id or folio.
    pub async fn create_sale(
        &self,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> ApiResult<CreatedSale> {
        let body = self
            .sales
            .client()
            .post_acknowledged(self.sales.path(), payload, idempotency_key)
            .await?;
        let created = CreatedSale::from_body(&body);

        match created.remote_id() {
            Some(remote_id) => info!(remote_id = %remote_id, "Sale created"),
            None => debug!("Sale created, no id returned"),
        }
        Ok(created)
    }

    pub async fn list_sales(&self, filter: &SaleFilter) -> ApiResult<Page<Sale>> {
        self.sales.list(filter).await
    }

    /// The printable ticket for a sale.
    pub async fn download_receipt(&self, id: i64) -> ApiResult<Download> {
        self.sales.download(id, "ticket", NO_QUERY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::test_support::signed_in_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_remote_id_forms() {
        let numeric = CreatedSale { id: json!(991), folio: None };
        assert_eq!(numeric.remote_id().as_deref(), Some("991"));

        let text = CreatedSale { id: json!("V-12"), folio: None };
        assert_eq!(text.remote_id().as_deref(), Some("V-12"));

        assert_eq!(CreatedSale::default().remote_id(), None);
    }

    #[test]
    fn test_created_sale_from_odd_bodies() {
        let created = CreatedSale::from_body(&json!({"id": 5, "folio": 17}));
        assert_eq!(created.remote_id().as_deref(), Some("5"));
        assert_eq!(created.folio.as_deref(), Some("17"));

        let created = CreatedSale::from_body(&json!({"folio": {"serie": "A"}}));
        assert_eq!(created.remote_id(), None);
        assert_eq!(created.folio, None);

        assert_eq!(CreatedSale::from_body(&json!([1, 2])), CreatedSale::default());
    }

    #[tokio::test]
    async fn test_create_sale_accepted_with_unexpected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pos/ventas/"))
            .respond_with(ResponseTemplate::new(201).set_body_raw(b"<html>ok</html>".to_vec(), "text/html"))
            .mount(&server)
            .await;

        let created = signed_in_client(&server)
            .pos()
            .create_sale(&json!({"total": 1}), Some("dev-1"))
            .await
            .unwrap();
        assert_eq!(created, CreatedSale::default());
    }

    #[tokio::test]
    async fn test_create_sale_sends_payload_and_key() {
        let server = MockServer::start().await;
        let payload = json!({"items": [{"product_id": "p1", "quantity": 1}], "total": 100});

        Mock::given(method("POST"))
            .and(path("/pos/ventas/"))
            .and(header("Idempotency-Key", "dev-1-7"))
            .and(body_json(payload.clone()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 55, "folio": "V-55"})))
            .expect(1)
            .mount(&server)
            .await;

        let created = signed_in_client(&server)
            .pos()
            .create_sale(&payload, Some("dev-1-7"))
            .await
            .unwrap();

        assert_eq!(created.remote_id().as_deref(), Some("55"));
        assert_eq!(created.folio.as_deref(), Some("V-55"));
    }

    #[tokio::test]
    async fn test_create_sale_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pos/ventas/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let created = signed_in_client(&server)
            .pos()
            .create_sale(&json!({"total": 1}), None)
            .await
            .unwrap();
        assert_eq!(created.remote_id(), None);
    }

    #[tokio::test]
    async fn test_create_sale_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pos/ventas/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"items": ["Producto sin existencia."]})),
            )
            .mount(&server)
            .await;

        let err = signed_in_client(&server)
            .pos()
            .create_sale(&json!({"items": []}), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(!err.is_offline());
        assert_eq!(err.to_string(), "items: Producto sin existencia.");
    }

    #[tokio::test]
    async fn test_download_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pos/ventas/55/ticket/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", "attachment; filename=\"ticket-55.pdf\"")
                    .set_body_raw(b"%PDF".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let receipt = signed_in_client(&server).pos().download_receipt(55).await.unwrap();
        assert_eq!(receipt.filename, "ticket-55.pdf");
    }
}
