//! # contable-api: REST Client for the Contable ERP Server
//!
//! Typed access to the ERP's HTTP/JSON API: the shared client with session
//! handling, the passwordless login flow, and one service per business area.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  service call ──► ApiClient::execute                                    │
//! │                     │                                                   │
//! │                     ├─ no access token ───────────────► NoSession       │
//! │                     ├─ token expiring? refresh first                    │
//! │                     ├─ send with `Authorization: Bearer …`              │
//! │                     │                                                   │
//! │                     ├─ 2xx ───────────────────────────► decoded body    │
//! │                     ├─ 401 ─► refresh (single flight) ─► retry once     │
//! │                     │           └─ rejected ─► clear ─► Unauthorized    │
//! │                     ├─ 4xx/5xx ─► ApiError::from_response(status, body) │
//! │                     └─ transport failure ─► Network / Timeout (offline) │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`client`] - `ApiClient`, downloads, uploads, pagination
//! - [`token`] - Token pair and the shared `TokenStore`
//! - [`auth`] - Login: email, then TOTP or passkey
//! - [`resource`] - Generic REST collection
//! - [`services`] - Invoicing, treasury, payroll, HR, inventory, POS, systems, reports
//! - [`error`] - `ApiError` and error-body parsing

pub mod auth;
pub mod client;
pub mod error;
pub mod resource;
pub mod services;
pub mod token;

pub use auth::{
    AuthService, LoginChallenge, LoginSuccess, PlatformAuthenticator, SecondFactor, UserProfile,
};
pub use client::{ApiClient, ApiClientConfig, Download, Page, NO_QUERY};
pub use error::{ApiError, ApiResult};
pub use resource::Resource;
pub use token::{TokenPair, TokenStore};
