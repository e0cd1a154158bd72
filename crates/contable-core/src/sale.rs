//! # Sale Types
//!
//! The pending sale record held by the offline queue and the typed payload
//! the point-of-sale screen builds.
//!
//! ## Pending Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Pending Sale Lifecycle                               │
//! │                                                                         │
//! │  Register completes a sale while offline (or queues it on purpose)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  enqueue(payload) ──► PendingSale { id: 7, status: Pending }           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SyncClient uploads payload ──► server answers 2xx                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mark_synced(7) ──► PendingSale { id: 7, status: Synced }              │
//! │                                                                         │
//! │  Pending ──► Synced only. Never back. Never deleted here.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Pending Sale Status
// =============================================================================

/// Upload state of a locally buffered sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PendingSaleStatus {
    /// Waiting for upload.
    #[default]
    Pending,
    /// Accepted by the server.
    Synced,
}

impl PendingSaleStatus {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: PendingSaleStatus) -> bool {
        match (self, next) {
            (PendingSaleStatus::Pending, _) => true,
            (PendingSaleStatus::Synced, PendingSaleStatus::Synced) => true,
            (PendingSaleStatus::Synced, PendingSaleStatus::Pending) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PendingSaleStatus::Pending => "pending",
            PendingSaleStatus::Synced => "synced",
        }
    }
}

impl std::fmt::Display for PendingSaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Pending Sale
// =============================================================================

/// A point-of-sale transaction buffered locally until the server accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PendingSale {
    /// Locally generated sequential id.
    pub id: i64,

    /// Opaque sale data as gathered at the register.
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,

    pub status: PendingSaleStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// First time the server accepted this sale.
    #[ts(as = "Option<String>")]
    pub synced_at: Option<DateTime<Utc>>,

    /// Failed upload attempts so far.
    pub attempts: i64,

    /// Message from the last failed attempt.
    pub last_error: Option<String>,

    /// Id the server assigned to the created sale.
    pub remote_id: Option<String>,
}

impl PendingSale {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == PendingSaleStatus::Pending
    }

    /// Decodes the payload as a typed sale, when it is one.
    pub fn sale_payload(&self) -> CoreResult<SalePayload> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| CoreError::InvalidPayload(e.to_string()))
    }
}

// =============================================================================
// Sale Payload
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Split tender across several methods.
    Mixed,
}

/// One line of a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLine {
    pub fn new(
        product_id: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        SaleLine {
            product_id: product_id.into(),
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Computes totals for `lines` with tax applied on the subtotal.
    pub fn compute(lines: &[SaleLine], tax_rate_bps: u32) -> Self {
        let subtotal: Money = lines.iter().map(SaleLine::line_total).sum();
        let tax = subtotal.apply_bps(tax_rate_bps);
        SaleTotals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Sale transaction as built by the point-of-sale screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalePayload {
    pub items: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub tax_rate_bps: u32,
    pub totals: SaleTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalePayload {
    /// Builds a payload and computes its totals.
    pub fn from_lines(items: Vec<SaleLine>, payment_method: PaymentMethod, tax_rate_bps: u32) -> Self {
        let totals = SaleTotals::compute(&items, tax_rate_bps);
        SalePayload {
            items,
            payment_method,
            customer_id: None,
            tax_rate_bps,
            totals,
            created_at: Utc::now(),
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Checks lines, the tax rate, and that every declared total matches
    /// the lines.
    pub fn validate(&self) -> CoreResult<()> {
        crate::validation::validate_sale_lines(&self.items)?;
        crate::validation::validate_tax_rate(self.tax_rate_bps)?;

        let expected = SaleTotals::compute(&self.items, self.tax_rate_bps);
        let declared = self.totals;
        let checks = [
            ("subtotal", expected.subtotal, declared.subtotal),
            ("tax", expected.tax, declared.tax),
            ("total", expected.total, declared.total),
        ];
        for (field, expected, actual) in checks {
            if expected != actual {
                return Err(CoreError::TotalsMismatch {
                    field,
                    expected: expected.cents(),
                    actual: actual.cents(),
                });
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> CoreResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| CoreError::InvalidPayload(e.to_string()))
    }
}
