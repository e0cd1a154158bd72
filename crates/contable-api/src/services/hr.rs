//! Employees: `/rrhh/empleados/`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{ApiClient, Page};
use crate::error::ApiResult;
use crate::resource::Resource;

pub const PATH: &str = "rrhh/empleados/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    pub hired_on: NaiveDate,
    #[serde(default)]
    pub daily_salary: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub hired_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_salary: Option<String>,
}

/// Partial update. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployeeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct HrService {
    employees: Resource<Employee>,
}

impl HrService {
    pub fn new(client: ApiClient) -> Self {
        HrService {
            employees: Resource::new(client, PATH),
        }
    }

    pub async fn list(&self, filter: &EmployeeFilter) -> ApiResult<Page<Employee>> {
        self.employees.list(filter).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Employee> {
        self.employees.get(id).await
    }

    pub async fn create(&self, employee: &NewEmployee) -> ApiResult<Employee> {
        let created = self.employees.create(employee).await?;
        info!(id = created.id, number = %created.employee_number, "Employee created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, changes: &EmployeeUpdate) -> ApiResult<Employee> {
        self.employees.update(id, changes).await
    }
}
