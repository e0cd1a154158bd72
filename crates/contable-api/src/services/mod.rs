//! # Domain Services
//!
//! Typed wrappers over the ERP's REST endpoints, one per business area.
//!
//! ```text
//! ApiClient ─┬─ auth()       /users/...
//!            ├─ invoicing()  /contabilidad/facturas/
//!            ├─ treasury()   /contabilidad/tesoreria/
//!            ├─ reports()    /contabilidad/reportes/
//!            ├─ payroll()    /rrhh/nominas/
//!            ├─ hr()         /rrhh/empleados/
//!            ├─ inventory()  /pos/productos/
//!            ├─ pos()        /pos/ventas/
//!            └─ systems()    /sistemas/tickets/
//! ```
//!
//! Services own a clone of the client, so they are as cheap to create as a
//! repository is from a `Database`.

pub mod hr;
pub mod inventory;
pub mod invoicing;
pub mod payroll;
pub mod pos;
pub mod reports;
pub mod systems;
pub mod treasury;

use crate::auth::AuthService;
use crate::client::ApiClient;

use self::hr::HrService;
use self::inventory::InventoryService;
use self::invoicing::InvoicingService;
use self::payroll::PayrollService;
use self::pos::PosService;
use self::reports::ReportsService;
use self::systems::SystemsService;
use self::treasury::TreasuryService;

impl ApiClient {
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.clone())
    }

    pub fn invoicing(&self) -> InvoicingService {
        InvoicingService::new(self.clone())
    }

    pub fn treasury(&self) -> TreasuryService {
        TreasuryService::new(self.clone())
    }

    pub fn payroll(&self) -> PayrollService {
        PayrollService::new(self.clone())
    }

    pub fn hr(&self) -> HrService {
        HrService::new(self.clone())
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.clone())
    }

    pub fn pos(&self) -> PosService {
        PosService::new(self.clone())
    }

    pub fn systems(&self) -> SystemsService {
        SystemsService::new(self.clone())
    }

    pub fn reports(&self) -> ReportsService {
        ReportsService::new(self.clone())
    }
}
