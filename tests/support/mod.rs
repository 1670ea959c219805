use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use rotacion_report::api::{self, AppState};
use rotacion_report::db::{InventorySource, SalesSource};
use rotacion_report::error::BoxError;
use rotacion_report::models::{RawRow, RawValue, DEFAULT_BRANCH};
use rotacion_report::ReportService;

/// Row from `(label, value)` pairs.
#[allow(dead_code)]
pub fn row(fields: &[(&str, RawValue)]) -> RawRow {
    fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[allow(dead_code)]
pub fn inventory_row(code: &str, received: f64, unit_cost: f64) -> RawRow {
    row(&[
        ("Código de Producto", code.into()),
        ("Nombre Aduanero", format!("PRODUCTO {code} 20X60 CMS").into()),
        ("Marca del Producto", "ACME".into()),
        ("Categoría Principal", "CERAMICA".into()),
        ("Subcategoría/Dimensiones", "POR ASIGNAR".into()),
        ("Unidades por Caja", RawValue::Int(12)),
        ("Total Unidades Ingresadas", RawValue::Float(received)),
        ("Costo Promedio Unitario (CLP)", RawValue::Float(unit_cost)),
        (
            "Historial de Ingresos (JSON)",
            "[{'Zeta':'Z1','Unidades Ingresadas':10,'Fecha Ingreso':'2024-02-01'}]".into(),
        ),
    ])
}

#[allow(dead_code)]
pub fn sales_row(code: &str, sold: f64, total: i64) -> RawRow {
    row(&[
        ("Código de Producto", code.into()),
        ("Nombre del Producto", format!("VENTA {code}").into()),
        ("Cantidad Total Vendida", RawValue::Float(sold)),
        ("Total Ventas (CLP)", RawValue::Int(total)),
        ("Cantidad de Ventas Registradas", RawValue::Int(3)),
    ])
}

/// In-memory inventory that records the arguments it was called with.
#[derive(Default)]
pub struct MemoryInventory {
    pub rows: Vec<RawRow>,
    pub fail: bool,
    pub calls: Mutex<Vec<(i32, String)>>,
}

#[async_trait]
impl InventorySource for MemoryInventory {
    async fn fetch_inventory(&self, year: i32, code_filter: &str) -> Result<Vec<RawRow>, BoxError> {
        self.calls.lock().unwrap().push((year, code_filter.to_string()));
        if self.fail {
            return Err("inventory database unreachable".into());
        }
        Ok(self.rows.clone())
    }
}

/// In-memory sales that records the arguments it was called with.
#[derive(Default)]
pub struct MemorySales {
    pub rows: Vec<RawRow>,
    pub fail: bool,
    pub calls: Mutex<Vec<(NaiveDate, NaiveDate, i32, String)>>,
}

#[async_trait]
impl SalesSource for MemorySales {
    async fn fetch_sales(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
        branch: i32,
        code_filter: &str,
    ) -> Result<Vec<RawRow>, BoxError> {
        self.calls
            .lock()
            .unwrap()
            .push((date_start, date_end, branch, code_filter.to_string()));
        if self.fail {
            return Err("sales database unreachable".into());
        }
        Ok(self.rows.clone())
    }
}

#[allow(dead_code)]
pub fn service(inventory: Arc<MemoryInventory>, sales: Arc<MemorySales>) -> ReportService {
    ReportService::new(inventory, sales)
}

#[allow(dead_code)]
pub fn app(inventory: Arc<MemoryInventory>, sales: Arc<MemorySales>) -> axum::Router {
    api::router(AppState {
        service: Arc::new(service(inventory, sales)),
        default_branch: DEFAULT_BRANCH,
    })
}
