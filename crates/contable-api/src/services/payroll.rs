//! Payroll runs: `/rrhh/nominas/`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{ApiClient, Download, Page, NO_QUERY};
use crate::error::ApiResult;
use crate::resource::Resource;

pub const PATH: &str = "rrhh/nominas/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    Draft,
    Calculated,
    Approved,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    pub id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: PayrollStatus,
    #[serde(default)]
    pub employee_count: u32,
    #[serde(default)]
    pub total_gross: Option<String>,
    #[serde(default)]
    pub total_deductions: Option<String>,
    #[serde(default)]
    pub total_net: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PayrollFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PayrollStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PayrollService {
    runs: Resource<PayrollRun>,
}

impl PayrollService {
    pub fn new(client: ApiClient) -> Self {
        PayrollService {
            runs: Resource::new(client, PATH),
        }
    }

    pub async fn list(&self, filter: &PayrollFilter) -> ApiResult<Page<PayrollRun>> {
        self.runs.list(filter).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<PayrollRun> {
        self.runs.get(id).await
    }

    /// Asks the server to compute the run. Returns the run with totals.
    pub async fn calculate(&self, id: i64) -> ApiResult<PayrollRun> {
        let run: PayrollRun = self.runs.action(id, "calcular", &json!({})).await?;
        info!(id, employees = run.employee_count, "Payroll calculated");
        Ok(run)
    }

    /// One employee's payslip for a run, as PDF.
    pub async fn download_payslip(&self, run_id: i64, employee_id: i64) -> ApiResult<Download> {
        let path = format!("{}recibos/{}/pdf/", self.runs.item_path(run_id), employee_id);
        self.runs.client().download(&path, NO_QUERY).await
    }

    /// The whole run as a spreadsheet.
    pub async fn export_xlsx(&self, id: i64) -> ApiResult<Download> {
        self.runs
            .download(id, "exportar", &[("format", "xlsx")])
            .await
    }
}
