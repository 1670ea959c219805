use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::raw::{FieldReader, RawRow};

/// Column labels produced by the inventory (MySQL) query.
pub mod labels {
    pub const CODE: &str = "Código de Producto";
    pub const CUSTOMS_NAME: &str = "Nombre Aduanero";
    pub const BRAND: &str = "Marca del Producto";
    pub const CATEGORY: &str = "Categoría Principal";
    pub const DIMENSIONS: &str = "Subcategoría/Dimensiones";
    pub const PACKING: &str = "Unidades por Caja";
    pub const UNITS_RECEIVED: &str = "Total Unidades Ingresadas";
    pub const AVG_CIF_USD: &str = "Costo Promedio CIF (USD)";
    pub const AVG_UNIT_COST_CLP: &str = "Costo Promedio Unitario (CLP)";
    pub const FIRST_RECEIPT: &str = "Fecha Primer Ingreso";
    pub const LAST_RECEIPT: &str = "Fecha Último Ingreso";
    pub const DAYS_IN_STOCK: &str = "Días Desde Primer Ingreso";
    pub const RECEIPT_COUNT: &str = "Cantidad de Ingresos";
    pub const RECEIPT_HISTORY: &str = "Historial de Ingresos (JSON)";
}

pub const UNASSIGNED: &str = "POR ASIGNAR";

/// One product code from the inventory source, aggregated over its receipts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub code: String,
    pub brand: String,
    pub category: String,
    pub dimensions: String,
    pub customs_name: String,
    pub packing: f64,
    pub avg_cif_usd: f64,
    pub avg_unit_cost_clp: f64,
    pub units_received: f64,
    pub days_in_stock: i64,
    pub first_receipt_date: String,
    pub last_receipt_date: String,
    pub receipt_count: i64,
    /// Opaque receipt-history blob, kept exactly as the query produced it.
    pub receipt_history: String,
}

impl InventoryRecord {
    /// Typed view of an inventory row. `None` when the row has no usable code.
    pub fn from_raw(row: &RawRow) -> Option<Self> {
        let code = FieldReader::new(row, "inventory").text(&[labels::CODE]);
        if code.trim().is_empty() {
            return None;
        }
        let f = FieldReader::new(row, "inventory").with_record(&code);

        let customs_name = f.text(&[labels::CUSTOMS_NAME]);
        let dimensions = resolve_dimensions(&f.text(&[labels::DIMENSIONS]), &customs_name);

        Some(Self {
            brand: f.text(&[labels::BRAND]),
            category: f.text(&[labels::CATEGORY]),
            dimensions,
            customs_name,
            packing: f.number(&[labels::PACKING]),
            avg_cif_usd: f.number(&[labels::AVG_CIF_USD]),
            avg_unit_cost_clp: f.number(&[labels::AVG_UNIT_COST_CLP]),
            units_received: f.number(&[labels::UNITS_RECEIVED]),
            days_in_stock: f.integer(&[labels::DAYS_IN_STOCK]),
            first_receipt_date: f.text(&[labels::FIRST_RECEIPT]),
            last_receipt_date: f.text(&[labels::LAST_RECEIPT]),
            receipt_count: f.integer(&[labels::RECEIPT_COUNT]),
            receipt_history: f.text(&[labels::RECEIPT_HISTORY]),
            code,
        })
    }
}

fn dimensions_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d+\s*[Xx]\s*\d+(?:\s*(?:CMS|CM|MM))?").expect("dimensions pattern is valid")
    })
}

/// Keeps an assigned dimensions label, otherwise pulls `NxM` out of the
/// customs name.
pub fn resolve_dimensions(label: &str, customs_name: &str) -> String {
    let trimmed = label.trim();
    if !trimmed.is_empty() && trimmed != UNASSIGNED && trimmed != "Sin Asignar" {
        return label.to_string();
    }
    extract_dimensions(customs_name).unwrap_or_else(|| UNASSIGNED.to_string())
}

pub fn extract_dimensions(name: &str) -> Option<String> {
    dimensions_pattern()
        .find(name)
        .map(|m| m.as_str().trim().to_string())
}

/// MySQL builds the history with single quotes; swap them so it parses as JSON.
pub fn repair_history_quotes(history: &str) -> String {
    let trimmed = history.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return "[]".to_string();
    }
    trimmed.replace('\'', "\"")
}

/// Parsed receipt history, when the repaired text is a JSON array.
pub fn parse_history(history: &str) -> Option<Vec<serde_json::Value>> {
    serde_json::from_str(&repair_history_quotes(history)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::raw::RawValue;

    fn row(pairs: &[(&str, RawValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn reads_all_fields_from_mixed_types() {
        let r = row(&[
            (labels::CODE, "CER-001".into()),
            (labels::CUSTOMS_NAME, "CERAMICA 60X60 CMS".into()),
            (labels::BRAND, "BEIGE".into()),
            (labels::CATEGORY, "PISOS".into()),
            (labels::DIMENSIONS, "60X60".into()),
            (labels::PACKING, "4.00".into()),
            (labels::UNITS_RECEIVED, RawValue::Float(120.0)),
            (labels::AVG_CIF_USD, "3.25".into()),
            (labels::AVG_UNIT_COST_CLP, RawValue::Int(2900)),
            (labels::DAYS_IN_STOCK, RawValue::Int(45)),
            (labels::RECEIPT_COUNT, RawValue::UInt(3)),
            (labels::RECEIPT_HISTORY, "[{'Zeta':'Z1'}]".into()),
        ]);
        let rec = InventoryRecord::from_raw(&r).unwrap();
        assert_eq!(rec.code, "CER-001");
        assert_eq!(rec.packing, 4.0);
        assert_eq!(rec.units_received, 120.0);
        assert_eq!(rec.avg_cif_usd, 3.25);
        assert_eq!(rec.avg_unit_cost_clp, 2900.0);
        assert_eq!(rec.days_in_stock, 45);
        assert_eq!(rec.receipt_count, 3);
        assert_eq!(rec.receipt_history, "[{'Zeta':'Z1'}]");
        assert_eq!(rec.first_receipt_date, "");
    }

    #[test]
    fn rows_without_code_are_rejected() {
        assert!(InventoryRecord::from_raw(&row(&[(labels::CODE, RawValue::Null)])).is_none());
        assert!(InventoryRecord::from_raw(&row(&[(labels::CODE, "  ".into())])).is_none());
        assert!(InventoryRecord::from_raw(&row(&[(labels::BRAND, "X".into())])).is_none());
    }

    #[test]
    fn unassigned_dimensions_come_from_the_name() {
        assert_eq!(resolve_dimensions("POR ASIGNAR", "PORCELANATO 20 x 120 CMS"), "20 x 120 CMS");
        assert_eq!(resolve_dimensions("", "GRES 33X33"), "33X33");
        assert_eq!(resolve_dimensions("Sin Asignar", "SIN MEDIDA"), UNASSIGNED);
        assert_eq!(resolve_dimensions("45X45", "GRES 33X33"), "45X45");
    }

    #[test]
    fn history_quotes_are_repaired() {
        let parsed = parse_history("[{'Zeta':'Z1','Unidades Ingresadas':10}]").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["Zeta"], "Z1");
        assert_eq!(parse_history("").unwrap().len(), 0);
        assert!(parse_history("not json").is_none());
    }
}
