//! Treasury: bank accounts and their movements, `/contabilidad/tesoreria/`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{ApiClient, Page, NO_QUERY};
use crate::error::ApiResult;
use crate::resource::Resource;

pub const ACCOUNTS_PATH: &str = "contabilidad/tesoreria/cuentas/";
pub const MOVEMENTS_PATH: &str = "contabilidad/tesoreria/movimientos/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub name: String,
    pub bank: String,
    /// Masked by the server (`****1234`).
    pub number: String,
    #[serde(default)]
    pub currency: Option<String>,
    pub balance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub account_id: i64,
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub concept: String,
    pub amount: String,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMovement {
    pub account_id: i64,
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub concept: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MovementFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct TreasuryService {
    accounts: Resource<BankAccount>,
    movements: Resource<Movement>,
}

impl TreasuryService {
    pub fn new(client: ApiClient) -> Self {
        TreasuryService {
            accounts: Resource::new(client.clone(), ACCOUNTS_PATH),
            movements: Resource::new(client, MOVEMENTS_PATH),
        }
    }

    pub async fn list_accounts(&self) -> ApiResult<Vec<BankAccount>> {
        Ok(self.accounts.list(NO_QUERY).await?.results)
    }

    /// Movements of one account, newest first as the server orders them.
    pub async fn list_movements(
        &self,
        account_id: i64,
        filter: &MovementFilter,
    ) -> ApiResult<Page<Movement>> {
        let path = self.accounts.action_path(account_id, "movimientos");
        self.movements.list_at(&path, filter).await
    }

    pub async fn create_movement(&self, movement: &NewMovement) -> ApiResult<Movement> {
        let created = self.movements.create(movement).await?;
        info!(id = created.id, account_id = created.account_id, "Bank movement recorded");
        Ok(created)
    }
}
