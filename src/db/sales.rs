use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tiberius::{Client, ColumnData, Config, FromSql, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::SalesSource;
use crate::error::BoxError;
use crate::models::{RawRow, RawValue};

/// Receipts and invoices of one branch in a date range, aggregated per
/// product code. Voided documents count with zero value.
///
/// Params: @P1 start date, @P2 end date, @P3 branch, @P4 code filter.
const SALES_QUERY: &str = r#"
WITH Documentos AS (
    SELECT
        CAST(VB.CORRELATIVO AS VARCHAR(20)) AS NumeroDocumento,
        VB.FECHA_VENTA AS FechaDocumento,
        PR.CODIGO_INTERNO AS CodigoProducto,
        PR.NOMBRE_PRODUCTO AS Producto,
        PR.PRECIO_VENTA AS PrecioProducto,
        PR.PRECIO_OFERTA AS PrecioOferta,
        DB.CANTIDAD AS CantidadVendida,
        DB.VALORUNITARIO AS PrecioVenta,
        CASE WHEN VB.NULA = 1 THEN 0
             ELSE ROUND(((DB.TOTAL - DB.IMPUESTO - DB.iva) / T.valor) - DB.ley18219, 2)
        END AS VentaNeta,
        ROUND(z.COSTO_UNITARIO, 2) AS CostoUnitario
    FROM VENTA_BOLETA VB
        INNER JOIN DETALLE_VENTA_BOLETA DB ON VB.ID_VENTA_BOLETA = DB.ID_VENTA_BOLETA
        INNER JOIN PRODUCTO PR ON DB.ID_PRODUCTO = PR.ID_PRODUCTO
        LEFT JOIN STOCKS z ON z.ID_SUCURSAL = VB.ID_SUCURSAL
                          AND z.ID_PRODUCTO = DB.ID_PRODUCTO
                          AND z.ZETA = DB.ZETA
                          AND z.ANIO = YEAR(VB.FECHA_VENTA)
        INNER JOIN TIPO_CAMBIO T ON T.fecha = VB.FECHA_VENTA
    WHERE VB.FECHA_VENTA >= @P1
      AND VB.FECHA_VENTA <= @P2
      AND VB.ID_SUCURSAL = @P3
    UNION ALL
    SELECT
        CAST(VF.CORRELATIVO AS VARCHAR(20)),
        VF.FECHA_EMISION,
        PR.CODIGO_INTERNO,
        PR.NOMBRE_PRODUCTO,
        PR.PRECIO_VENTA,
        PR.PRECIO_OFERTA,
        DF.CANTIDAD,
        DF.VALORUNITARIO,
        CASE WHEN VF.NULA = 1 THEN 0
             ELSE ROUND(((DF.TOTAL - DF.IMPUESTO - DF.iva) / T.valor) - DF.ley18219, 2)
        END,
        ROUND(z.COSTO_UNITARIO, 2)
    FROM VENTA_FACTURA VF
        INNER JOIN DETALLE_FAC_E DF ON VF.ID_VENTA_FACTURA = DF.ID_VENTA_FACTURA
        INNER JOIN PRODUCTO PR ON DF.ID_PRODUCTO = PR.ID_PRODUCTO
        LEFT JOIN STOCKS z ON z.ID_SUCURSAL = VF.ID_SUCURSAL
                          AND z.ID_PRODUCTO = DF.ID_PRODUCTO
                          AND z.ZETA = DF.ZETA
                          AND z.ANIO = YEAR(VF.FECHA_EMISION)
        INNER JOIN TIPO_CAMBIO T ON T.fecha = VF.FECHA_EMISION
    WHERE VF.FECHA_EMISION >= @P1
      AND VF.FECHA_EMISION <= @P2
      AND VF.ID_SUCURSAL = @P3
)
SELECT
    CodigoProducto AS "Código de Producto",
    MAX(Producto) AS "Nombre del Producto",
    ROUND(SUM(CostoUnitario * CantidadVendida) / NULLIF(SUM(CantidadVendida), 0), 2) AS "Costo Unitario",
    MAX(PrecioProducto) AS "Precio Base (CLP)",
    MAX(PrecioOferta) AS "Precio de Oferta (CLP)",
    SUM(CantidadVendida) AS "Cantidad Total Vendida",
    ROUND(SUM(VentaNeta), 0) AS "Total Ventas (CLP)",
    CAST(MAX(FechaDocumento) AS DATE) AS "Última Fecha de Venta",
    ROUND(SUM(PrecioVenta * CantidadVendida) / NULLIF(SUM(CantidadVendida), 0), 0) AS "Precio Promedio Ponderado (CLP)",
    COUNT(DISTINCT NumeroDocumento) AS "Cantidad de Ventas Registradas"
FROM Documentos
WHERE @P4 = '' OR CodigoProducto LIKE '%' + @P4 + '%'
GROUP BY CodigoProducto
ORDER BY CodigoProducto
"#;

/// Sales source backed by SQL Server. Opens one connection per fetch.
#[derive(Clone)]
pub struct SqlServerSales {
    config: Config,
}

impl SqlServerSales {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<Client<Compat<TcpStream>>, BoxError> {
        let tcp = TcpStream::connect(self.config.get_addr()).await?;
        tcp.set_nodelay(true)?;
        let client = Client::connect(self.config.clone(), tcp.compat_write()).await?;
        Ok(client)
    }
}

#[async_trait]
impl SalesSource for SqlServerSales {
    async fn fetch_sales(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
        branch: i32,
        code_filter: &str,
    ) -> Result<Vec<RawRow>, BoxError> {
        let start = std::time::Instant::now();
        let mut client = self.connect().await?;

        let mut query = Query::new(SALES_QUERY);
        query.bind(date_start);
        query.bind(date_end);
        query.bind(branch);
        query.bind(code_filter.to_string());

        let rows = query.query(&mut client).await?.into_first_result().await?;
        tracing::debug!("sales query returned {} rows in {:?}", rows.len(), start.elapsed());
        Ok(rows.into_iter().map(row_to_raw).collect())
    }
}

/// Column label -> value for one SQL Server row.
pub fn row_to_raw(row: Row) -> RawRow {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    names
        .into_iter()
        .zip(row)
        .map(|(name, data)| (name, column_value(&data)))
        .collect()
}

fn column_value(data: &ColumnData<'static>) -> RawValue {
    match data {
        ColumnData::U8(v) => v.map_or(RawValue::Null, |n| RawValue::Int(n.into())),
        ColumnData::I16(v) => v.map_or(RawValue::Null, |n| RawValue::Int(n.into())),
        ColumnData::I32(v) => v.map_or(RawValue::Null, |n| RawValue::Int(n.into())),
        ColumnData::I64(v) => v.map_or(RawValue::Null, RawValue::Int),
        ColumnData::F32(v) => v.map_or(RawValue::Null, |f| RawValue::Float(f.into())),
        ColumnData::F64(v) => v.map_or(RawValue::Null, RawValue::Float),
        ColumnData::Bit(v) => v.map_or(RawValue::Null, |b| RawValue::Int(b.into())),
        ColumnData::String(v) => v.as_deref().map_or(RawValue::Null, RawValue::from),
        ColumnData::Numeric(v) => v.as_ref().map_or(RawValue::Null, |n| {
            RawValue::Float(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
        }),
        ColumnData::Date(_) => match NaiveDate::from_sql(data) {
            Ok(Some(d)) => RawValue::Date(d),
            _ => RawValue::Null,
        },
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            match NaiveDateTime::from_sql(data) {
                Ok(Some(dt)) => RawValue::DateTime(dt),
                _ => RawValue::Null,
            }
        }
        other => {
            tracing::debug!("unsupported sql server column read as null: {:?}", other);
            RawValue::Null
        }
    }
}
