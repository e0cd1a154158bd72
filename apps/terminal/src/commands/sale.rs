//! # Sale Commands
//!
//! ```text
//! complete_sale(payload)
//!   validate ─► require PosSell ─► POST /pos/ventas/
//!                                    │ 2xx          ─► Completed { remote_id, folio }
//!                                    │ unreachable  ─► enqueue ─► Queued { local_id }
//!                                    │ 4xx / 5xx    ─► error (nothing queued)
//! ```

use contable_core::{Permission, SalePayload};
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::CommandResult;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaleOutcome {
    /// The server recorded the sale.
    Completed {
        remote_id: Option<String>,
        folio: Option<String>,
    },
    /// The server was unreachable; the sale waits in the offline queue.
    Queued { local_id: i64 },
}

pub async fn complete_sale(state: &AppState, payload: &SalePayload) -> CommandResult<SaleOutcome> {
    debug!("complete_sale command");

    payload.validate()?;
    state.require(Permission::PosSell)?;
    let body = payload.to_value()?;

    match state.api().pos().create_sale(&body, None).await {
        Ok(created) => {
            let remote_id = created.remote_id();
            info!(
                remote_id = remote_id.as_deref().unwrap_or("-"),
                total = payload.totals.total.cents(),
                "Sale completed"
            );
            Ok(SaleOutcome::Completed {
                remote_id,
                folio: created.folio,
            })
        }
        Err(e) if e.is_offline() => {
            warn!(error = %e, "Server unreachable, queueing sale");
            let local_id = enqueue(state, &body).await?;
            Ok(SaleOutcome::Queued { local_id })
        }
        Err(e) => Err(e.into()),
    }
}

/// Queues a sale without trying the server first.
pub async fn queue_sale(state: &AppState, payload: &SalePayload) -> CommandResult<i64> {
    debug!("queue_sale command");

    payload.validate()?;
    state.require(Permission::PosSell)?;
    let body = payload.to_value()?;

    enqueue(state, &body).await
}

async fn enqueue(state: &AppState, body: &serde_json::Value) -> CommandResult<i64> {
    let local_id = state.db().pending_sales().enqueue(body).await?;
    state.sync().notify_queued();
    info!(local_id, "Sale queued for sync");
    Ok(local_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use crate::state::test_support::{signed_in, user};
    use contable_core::{Money, PaymentMethod, SaleLine};
    use contable_db::{Database, DbConfig};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sale() -> SalePayload {
        SalePayload::from_lines(
            vec![
                SaleLine::new("P-1", "Café americano", 2, Money::from_cents(3500)),
                SaleLine::new("P-7", "Concha", 1, Money::from_cents(1800)),
            ],
            PaymentMethod::Cash,
            1600,
        )
    }

    #[tokio::test]
    async fn test_online_sale_completes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pos/ventas/"))
            .and(body_partial_json(json!({"payment_method": "cash"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 77, "folio": "T-0077"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let state = signed_in(&server, &["pos.add_venta"]).await;

        let outcome = complete_sale(&state, &sale()).await.unwrap();
        assert_eq!(
            outcome,
            SaleOutcome::Completed {
                remote_id: Some("77".into()),
                folio: Some("T-0077".into()),
            }
        );
        assert_eq!(state.db().pending_sales().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_sale_is_queued() {
        let mut config = AppConfig::default();
        config.server.base_url = "http://127.0.0.1:9".into();
        config.sync.enabled = false;
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (state, _task) = AppState::with_database(config, db, None).await.unwrap();
        state
            .api()
            .tokens()
            .set(contable_api::TokenPair::new("acc", "ref"));
        state.sign_in(user(&["pos.add_venta"]), false).await.unwrap();

        let payload = sale();
        let outcome = complete_sale(&state, &payload).await.unwrap();
        let SaleOutcome::Queued { local_id } = outcome else {
            panic!("expected a queued sale, got {outcome:?}");
        };

        let queued = state.db().pending_sales().get(local_id).await.unwrap().unwrap();
        assert!(queued.is_pending());
        assert_eq!(queued.sale_payload().unwrap(), payload);
    }

    #[tokio::test]
    async fn test_rejected_sale_is_not_queued() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pos/ventas/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"items": ["Producto sin existencia."]})),
            )
            .mount(&server)
            .await;
        let state = signed_in(&server, &["pos.add_venta"]).await;

        let err = complete_sale(&state, &sale()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.fields.contains_key("items"));
        assert_eq!(state.db().pending_sales().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_requires_permission() {
        let server = MockServer::start().await;
        let state = signed_in(&server, &["pos.view_venta"]).await;

        let err = complete_sale(&state, &sale()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tampered_totals_rejected_before_anything_else() {
        let server = MockServer::start().await;
        let state = signed_in(&server, &["pos.add_venta"]).await;

        let mut payload = sale();
        payload.totals.total = Money::from_cents(1);

        let err = complete_sale(&state, &payload).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let err = queue_sale(&state, &payload).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(state.db().pending_sales().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_queue_sale_updates_sync_status() {
        let server = MockServer::start().await;
        let state = signed_in(&server, &["pos.add_venta"]).await;
        let mut status = state.sync().subscribe();

        let first = queue_sale(&state, &sale()).await.unwrap();
        let second = queue_sale(&state, &sale()).await.unwrap();
        assert!(second > first);

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while status.borrow_and_update().pending_count != 2 {
                status.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
