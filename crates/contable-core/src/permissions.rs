//! # Permissions
//!
//! Typed permissions and the capability set resolved once per session.
//!
//! The ERP server sends permissions as `"module.action"` strings. They are
//! parsed into [`Permission`] values when the session starts; after that
//! every check is a set lookup on a closed enum.
//!
//! ```text
//! server: ["contabilidad.view_factura", "pos.add_venta", "x.unknown"]
//!                          │
//!                          ▼  CapabilitySet::resolve (once)
//! {InvoicesView, PosSell}          ("x.unknown" dropped, logged at debug)
//!                          │
//!                          ▼
//! caps.require(Permission::PosSell)?   ← every command
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use ts_rs::TS;

use crate::error::CoreError;

/// Everything a session can be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    InvoicesView,
    InvoicesCreate,
    TreasuryView,
    TreasuryManage,
    PayrollView,
    PayrollCalculate,
    HrView,
    HrManage,
    InventoryView,
    InventoryAdjust,
    PosSell,
    PosViewSales,
    ReportsView,
    SystemsTickets,
    SystemsAdmin,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
        Permission::InvoicesView,
        Permission::InvoicesCreate,
        Permission::TreasuryView,
        Permission::TreasuryManage,
        Permission::PayrollView,
        Permission::PayrollCalculate,
        Permission::HrView,
        Permission::HrManage,
        Permission::InventoryView,
        Permission::InventoryAdjust,
        Permission::PosSell,
        Permission::PosViewSales,
        Permission::ReportsView,
        Permission::SystemsTickets,
        Permission::SystemsAdmin,
    ];

    /// The server-side `"module.action"` string.
    pub fn code(&self) -> &'static str {
        match self {
            Permission::InvoicesView => "contabilidad.view_factura",
            Permission::InvoicesCreate => "contabilidad.add_factura",
            Permission::TreasuryView => "contabilidad.view_tesoreria",
            Permission::TreasuryManage => "contabilidad.change_tesoreria",
            Permission::PayrollView => "rrhh.view_nomina",
            Permission::PayrollCalculate => "rrhh.calcular_nomina",
            Permission::HrView => "rrhh.view_empleado",
            Permission::HrManage => "rrhh.change_empleado",
            Permission::InventoryView => "pos.view_producto",
            Permission::InventoryAdjust => "pos.ajustar_stock",
            Permission::PosSell => "pos.add_venta",
            Permission::PosViewSales => "pos.view_venta",
            Permission::ReportsView => "contabilidad.view_reporte",
            Permission::SystemsTickets => "sistemas.add_ticket",
            Permission::SystemsAdmin => "sistemas.admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form used in logs and error messages.
        let short = match self {
            Permission::InvoicesView => "invoices.view",
            Permission::InvoicesCreate => "invoices.create",
            Permission::TreasuryView => "treasury.view",
            Permission::TreasuryManage => "treasury.manage",
            Permission::PayrollView => "payroll.view",
            Permission::PayrollCalculate => "payroll.calculate",
            Permission::HrView => "hr.view",
            Permission::HrManage => "hr.manage",
            Permission::InventoryView => "inventory.view",
            Permission::InventoryAdjust => "inventory.adjust",
            Permission::PosSell => "pos.sell",
            Permission::PosViewSales => "pos.view_sales",
            Permission::ReportsView => "reports.view",
            Permission::SystemsTickets => "systems.tickets",
            Permission::SystemsAdmin => "systems.admin",
        };
        f.write_str(short)
    }
}

/// Error for a permission string with no typed counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl fmt::Display for UnknownPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permission '{}'", self.0)
    }
}

impl std::error::Error for UnknownPermission {}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.code() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

// =============================================================================
// Capability Set
// =============================================================================

/// The permissions a signed-in session holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CapabilitySet {
    granted: BTreeSet<Permission>,
}

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every permission (superusers).
    pub fn all() -> Self {
        CapabilitySet {
            granted: Permission::ALL.iter().copied().collect(),
        }
    }

    /// Resolves server permission strings into a capability set.
    ///
    /// Unknown strings are ignored; the server grants more than this client
    /// knows how to use.
    pub fn resolve<I, S>(codes: I, is_superuser: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if is_superuser {
            return Self::all();
        }

        let mut granted = BTreeSet::new();
        for code in codes {
            match code.as_ref().parse::<Permission>() {
                Ok(p) => {
                    granted.insert(p);
                }
                Err(e) => debug!(%e, "Ignoring permission"),
            }
        }
        CapabilitySet { granted }
    }

    #[inline]
    pub fn has(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    pub fn has_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has(*p))
    }

    pub fn require(&self, permission: Permission) -> Result<(), CoreError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(CoreError::MissingPermission(permission))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.granted.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

impl FromIterator<Permission> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        CapabilitySet {
            granted: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_parse_back() {
        let codes: BTreeSet<&str> = Permission::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes.len(), Permission::ALL.len());

        for p in Permission::ALL {
            assert_eq!(p.code().parse::<Permission>().unwrap(), p);
        }
    }

    #[test]
    fn test_resolve_drops_unknown_strings() {
        let caps = CapabilitySet::resolve(
            ["contabilidad.view_factura", "pos.add_venta", "legacy.thing", ""],
            false,
        );
        assert_eq!(caps.len(), 2);
        assert!(caps.has(Permission::InvoicesView));
        assert!(caps.has(Permission::PosSell));
        assert!(!caps.has(Permission::PayrollView));
    }

    #[test]
    fn test_superuser_gets_everything() {
        let caps = CapabilitySet::resolve(Vec::<String>::new(), true);
        for p in Permission::ALL {
            assert!(caps.has(p));
        }
    }

    #[test]
    fn test_require() {
        let caps: CapabilitySet = [Permission::HrView].into_iter().collect();
        assert!(caps.require(Permission::HrView).is_ok());
        assert!(matches!(
            caps.require(Permission::HrManage),
            Err(CoreError::MissingPermission(Permission::HrManage))
        ));
        assert!(caps.has_any(&[Permission::HrManage, Permission::HrView]));
    }
}
