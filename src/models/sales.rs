use serde::{Deserialize, Serialize};

use super::raw::{FieldReader, RawRow};

/// Column labels produced by the aggregated sales (SQL Server) query.
pub mod labels {
    pub const CODE: &str = "Código de Producto";
    pub const PRODUCT_NAME: &str = "Nombre del Producto";
    pub const UNIT_COST: &str = "Costo Unitario";
    pub const BASE_PRICE: &str = "Precio Base (CLP)";
    pub const OFFER_PRICE: &str = "Precio de Oferta (CLP)";
    pub const QUANTITY_SOLD: &str = "Cantidad Total Vendida";
    pub const QUANTITY_SOLD_ALT: &str = "Cantidad Vendida";
    pub const TOTAL_SALES: &str = "Total Ventas (CLP)";
    pub const LAST_SALE: &str = "Última Fecha de Venta";
    pub const AVG_SALE_PRICE: &str = "Precio Promedio Ponderado (CLP)";
    pub const TRANSACTIONS: &str = "Cantidad de Ventas Registradas";
}

/// One product code from the sales source, pre-aggregated over the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub code: String,
    pub product_name: String,
    pub unit_cost: f64,
    pub base_price_clp: i64,
    pub offer_price_clp: i64,
    pub quantity_sold: f64,
    pub total_sale_value_clp: i64,
    pub last_sale_date: String,
    pub avg_sale_price_clp: i64,
    pub transaction_count: i64,
}

impl SalesRecord {
    /// Typed view of a sales row. `None` when the row has no usable code.
    pub fn from_raw(row: &RawRow) -> Option<Self> {
        let code = FieldReader::new(row, "sales").text(&[labels::CODE]);
        if code.trim().is_empty() {
            return None;
        }
        let f = FieldReader::new(row, "sales").with_record(&code);

        Some(Self {
            product_name: f.text(&[labels::PRODUCT_NAME]),
            unit_cost: f.number(&[labels::UNIT_COST]),
            base_price_clp: f.integer(&[labels::BASE_PRICE]),
            offer_price_clp: f.integer(&[labels::OFFER_PRICE]),
            quantity_sold: f.number(&[labels::QUANTITY_SOLD, labels::QUANTITY_SOLD_ALT]),
            total_sale_value_clp: f.integer(&[labels::TOTAL_SALES]),
            last_sale_date: f.text(&[labels::LAST_SALE]),
            avg_sale_price_clp: f.integer(&[labels::AVG_SALE_PRICE]),
            transaction_count: f.integer(&[labels::TRANSACTIONS]),
            code,
        })
    }
}
