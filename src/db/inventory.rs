use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row, TypeInfo};

use super::InventorySource;
use crate::error::BoxError;
use crate::models::{RawRow, RawValue};

/// Receipts grouped per (code, package size) for one production year.
///
/// Binds: year, code filter, code filter. An empty filter matches every code.
const INVENTORY_QUERY: &str = r#"
SELECT
    COD_ART AS "Código de Producto",
    MAX(DES_ADU) AS "Nombre Aduanero",
    MAX(IFNULL(Marca, 'POR ASIGNAR')) AS "Marca del Producto",
    MAX(IFNULL(SubFamilia, 'POR ASIGNAR')) AS "Categoría Principal",
    MAX(IFNULL(NomDetSubFam, '')) AS "Subcategoría/Dimensiones",
    UNI_CAJ AS "Unidades por Caja",
    SUM(CAN_ING) AS "Total Unidades Ingresadas",
    ROUND(IF(SUM(CAN_ING) = 0, 0, SUM(CIF_UNI * CAN_ING) / SUM(CAN_ING)), 2) AS "Costo Promedio CIF (USD)",
    ROUND(IF(SUM(CAN_ING) = 0, 0, SUM(COS_UNI * CAN_ING) / SUM(CAN_ING)), 2) AS "Costo Promedio Unitario (CLP)",
    MIN(fec_ing) AS "Fecha Primer Ingreso",
    MAX(fec_ing) AS "Fecha Último Ingreso",
    DATEDIFF(CURDATE(), MIN(fec_ing)) AS "Días Desde Primer Ingreso",
    COUNT(*) AS "Cantidad de Ingresos",
    CONCAT('[', GROUP_CONCAT(DISTINCT CONCAT(
        '{\'Zeta\':\'', ZET_ART, '\',',
        '\'Año Producción\':\'', ANIO_PRO, '\',',
        '\'Unidades Ingresadas\':', CAN_ING, ',',
        '\'Fecha Ingreso\':\'', DATE_FORMAT(fec_ing, '%Y-%m-%d'), '\'}'
    ) SEPARATOR ','), ']') AS "Historial de Ingresos (JSON)"
FROM saldos s
WHERE
    CAST(ANIO_PRO AS SIGNED) = ?
    AND (? = '' OR COD_ART LIKE CONCAT('%', ?, '%'))
GROUP BY COD_ART, UNI_CAJ
ORDER BY COD_ART
"#;

/// Inventory source backed by the MySQL `saldos` table.
#[derive(Clone)]
pub struct MySqlInventory {
    pool: MySqlPool,
}

impl MySqlInventory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventorySource for MySqlInventory {
    async fn fetch_inventory(&self, year: i32, code_filter: &str) -> Result<Vec<RawRow>, BoxError> {
        let start = std::time::Instant::now();
        let rows = sqlx::query(INVENTORY_QUERY)
            .bind(year)
            .bind(code_filter)
            .bind(code_filter)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!("inventory query returned {} rows in {:?}", rows.len(), start.elapsed());
        Ok(rows.iter().map(row_to_raw).collect())
    }
}

/// Column label -> value for one MySQL row.
pub fn row_to_raw(row: &MySqlRow) -> RawRow {
    row.columns()
        .iter()
        .map(|col| {
            let value = column_value(row, col.ordinal(), col.type_info().name());
            (col.name().to_string(), value)
        })
        .collect()
}

fn column_value(row: &MySqlRow, idx: usize, type_name: &str) -> RawValue {
    let decoded: Result<Option<RawValue>, sqlx::Error> = match type_name {
        "NULL" => Ok(None),
        "BOOLEAN" => row.try_get::<Option<bool>, _>(idx).map(|v| v.map(|b| RawValue::Int(b.into()))),
        t if t.ends_with("UNSIGNED") => row.try_get::<Option<u64>, _>(idx).map(|v| v.map(RawValue::UInt)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(idx).map(|v| v.map(RawValue::Int))
        }
        "FLOAT" => row
            .try_get::<Option<f32>, _>(idx)
            .map(|v| v.map(|f| RawValue::Float(f.into()))),
        "DOUBLE" => row.try_get::<Option<f64>, _>(idx).map(|v| v.map(RawValue::Float)),
        "DECIMAL" => row
            .try_get::<Option<BigDecimal>, _>(idx)
            .map(|v| v.map(RawValue::Decimal)),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(idx).map(|v| v.map(RawValue::Date)),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)
            .map(|v| v.map(RawValue::DateTime)),
        _ => text_value(row, idx),
    };

    match decoded {
        Ok(value) => value.unwrap_or(RawValue::Null),
        Err(e) => {
            tracing::debug!(column = idx, type_name, "undecodable column read as null: {}", e);
            RawValue::Null
        }
    }
}

/// Text columns, including binary-collated ones such as GROUP_CONCAT output.
fn text_value(row: &MySqlRow, idx: usize) -> Result<Option<RawValue>, sqlx::Error> {
    match row.try_get::<Option<String>, _>(idx) {
        Ok(v) => Ok(v.map(RawValue::Text)),
        Err(_) => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| v.map(|bytes| RawValue::Text(String::from_utf8_lossy(&bytes).into_owned()))),
    }
}
