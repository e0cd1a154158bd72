//! # Commands Module
//!
//! Everything the front end can ask the terminal to do. Each command is a
//! plain async function over `&AppState` returning `CommandResult<T>`,
//! where `T` serializes to the DTO the screen renders.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── auth.rs     ◄─── Passwordless login, logout, session restore
//! ├── sale.rs     ◄─── Complete / queue point-of-sale tickets
//! ├── sync.rs     ◄─── Offline queue status and manual sync
//! ├── reports.rs  ◄─── Invoice PDFs and accounting reports to disk
//! └── ui.rs       ◄─── Sidebar preference
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Front end                                                              │
//! │  ─────────                                                              │
//! │  const outcome = await invoke('complete_sale', { payload });            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Rust Backend                                                           │
//! │  ────────────                                                           │
//! │  async fn complete_sale(                                                │
//! │      state: &AppState,         ◄── built once at startup               │
//! │      payload: &SalePayload,    ◄── from the invoke params              │
//! │  ) -> CommandResult<SaleOutcome>                                        │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  { "outcome": "queued", "local_id": 14 }                                │
//! │  or { "code": "FORBIDDEN", "message": "..." }                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands that act on business data check a [`Permission`] first with
//! `state.require(..)`.
//!
//! [`Permission`]: contable_core::Permission

pub mod auth;
pub mod reports;
pub mod sale;
pub mod sync;
pub mod ui;
