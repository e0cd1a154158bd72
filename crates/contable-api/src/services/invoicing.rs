//! Invoices: `/contabilidad/facturas/`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{ApiClient, Download, Page, NO_QUERY};
use crate::error::{ApiError, ApiResult};
use crate::resource::Resource;

pub const PATH: &str = "contabilidad/facturas/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

/// Amounts are decimal strings exactly as the server formats them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub folio: String,
    #[serde(default)]
    pub series: Option<String>,
    pub customer_id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub customer_tax_id: Option<String>,
    pub issued_on: NaiveDate,
    pub status: InvoiceStatus,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "MXN".to_string()
}

/// Query for the invoice list. Unset fields are left out of the URL.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvoiceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_id: i64,
    pub issued_on: NaiveDate,
    pub lines: Vec<NewInvoiceLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Invoice operations.
#[derive(Debug, Clone)]
pub struct InvoicingService {
    invoices: Resource<Invoice>,
}

impl InvoicingService {
    pub fn new(client: ApiClient) -> Self {
        InvoicingService {
            invoices: Resource::new(client, PATH),
        }
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> ApiResult<Page<Invoice>> {
        self.invoices.list(filter).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Invoice> {
        self.invoices.get(id).await
    }

    pub async fn create(&self, invoice: &NewInvoice) -> ApiResult<Invoice> {
        if invoice.lines.is_empty() {
            return Err(ApiError::Validation {
                message: "An invoice needs at least one line".to_string(),
                fields: [("lines".to_string(), vec!["Required.".to_string()])].into(),
            });
        }

        let created = self.invoices.create(invoice).await?;
        info!(id = created.id, folio = %created.folio, "Invoice created");
        Ok(created)
    }

    /// Cancels an issued invoice. The reason is kept by the server.
    pub async fn cancel(&self, id: i64, reason: &str) -> ApiResult<Invoice> {
        let cancelled: Invoice = self
            .invoices
            .action(id, "cancelar", &json!({ "reason": reason }))
            .await?;
        info!(id, "Invoice cancelled");
        Ok(cancelled)
    }

    pub async fn download_pdf(&self, id: i64) -> ApiResult<Download> {
        self.invoices.download(id, "pdf", NO_QUERY).await
    }
}
