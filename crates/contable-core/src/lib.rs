//! # contable-core: Domain Types for the Contable ERP Client
//!
//! Pure types shared by every other crate in the workspace. Nothing in here
//! touches the network, the disk or a clock it was not handed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Contable Client Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/terminal (commands + AppState)              │   │
//! │  └───────────────┬──────────────────────────────┬──────────────────┘   │
//! │                  │                              │                       │
//! │  ┌───────────────▼─────────────┐  ┌─────────────▼──────────────────┐   │
//! │  │ contable-sync (flush queue) │  │ contable-api (REST + login)    │   │
//! │  └───────────────┬─────────────┘  └─────────────┬──────────────────┘   │
//! │                  │                              │                       │
//! │  ┌───────────────▼─────────────┐                │                       │
//! │  │ contable-db (SQLite)        │                │                       │
//! │  └───────────────┬─────────────┘                │                       │
//! │                  │                              │                       │
//! │  ┌───────────────▼──────────────────────────────▼──────────────────┐   │
//! │  │               ★ contable-core (THIS CRATE) ★                    │   │
//! │  │   sale · money · permissions · validation · error               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sale`] - Pending sale records and the typed sale payload
//! - [`money`] - Integer-cent money type
//! - [`permissions`] - Typed permissions and the per-session capability set
//! - [`validation`] - Input checks run before talking to the server
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use contable_core::money::Money;
//! use contable_core::sale::{PaymentMethod, SaleLine, SalePayload};
//!
//! let payload = SalePayload::from_lines(
//!     vec![SaleLine::new("P-1", "Coffee", 2, Money::from_cents(250))],
//!     PaymentMethod::Cash,
//!     1600, // 16% VAT
//! );
//! assert_eq!(payload.totals.subtotal.cents(), 500);
//! assert_eq!(payload.totals.tax.cents(), 80);
//! assert_eq!(payload.totals.total.cents(), 580);
//! ```

pub mod error;
pub mod money;
pub mod permissions;
pub mod sale;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permissions::{CapabilitySet, Permission};
pub use sale::{
    PaymentMethod, PendingSale, PendingSaleStatus, SaleLine, SalePayload, SaleTotals,
};

/// Maximum lines accepted on a single point-of-sale ticket.
pub const MAX_SALE_LINES: usize = 200;

/// Maximum quantity accepted on a single line.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum unit price on a line, in cents (100 million pesos).
///
/// With the line and quantity limits this keeps every ticket total well
/// inside `i64`.
pub const MAX_UNIT_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum tax rate in basis points (100%).
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

/// Number of digits in a time-based one-time code.
pub const TOTP_CODE_LENGTH: usize = 6;
