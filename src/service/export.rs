use chrono::NaiveDate;
use csv::Writer;
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::error::ReportError;
use crate::models::{coerce_number, coerce_text, CombinedReport, CombinedReportEntry, RawRow};

/// Report columns shared by every combined export, in spreadsheet order.
pub const COLUMNS: [&str; 22] = [
    "Codigo_Producto",
    "NOMBRE",
    "MARCA",
    "CATEGORIA",
    "DIMENSIONES",
    "PACKING",
    "CIF PROMEDIO USD",
    "CANTIDAD VENDIDA",
    "CANTIDAD TRANSACCIONES",
    "% VENDIDO",
    "PRECIO PRODUCTO CLP",
    "PRECIO OFERTA CLP",
    "PROMEDIO DEL PRECIO VENTA CLP",
    "FECHA ULTIMO INGRESO",
    "ULTIMA FECHA VENTA",
    "CANTIDAD INGRESADA",
    "FECHA PRIMER INGRESO",
    "CANTIDAD DE DIAS EN INVENTARIO",
    "VENTA NETA TOTAL CLP",
    "UTILIDAD CLP",
    "RANKING POR CANTIDAD VENDIDA",
    "RANKING VENTA",
];

/// Status column that prefixes the single-sheet CSV export.
pub const STATUS_COLUMN: &str = "ESTADO";

pub const MATCHED_SHEET: &str = "Productos Coincidentes";
pub const UNMATCHED_SHEET: &str = "Productos Sin Coincidencia";

/// Raw-row labels written with a comma decimal separator.
const DECIMAL_LABELS: [&str; 5] = [
    "Costo Promedio CIF (USD)",
    "Costo Promedio Unitario (CLP)",
    "Unidades por Caja",
    "Total Unidades Ingresadas",
    "Cantidad Total Vendida",
];

/// `Reporte_Combinado_<start>_<end>.<ext>`
pub fn export_file_name(date_start: NaiveDate, date_end: NaiveDate, ext: &str) -> String {
    format!("Reporte_Combinado_{}_{}.{}", date_start, date_end, ext)
}

/// `Inventario_<year>[_<code>].<ext>`
pub fn inventory_file_name(year: i32, code_filter: &str, ext: &str) -> String {
    if code_filter.is_empty() {
        format!("Inventario_{}.{}", year, ext)
    } else {
        format!("Inventario_{}_{}.{}", year, code_filter, ext)
    }
}

/// `Ventas_Sucursal_<branch>_<start>_al_<end>.<ext>`
pub fn sales_file_name(branch: i32, date_start: NaiveDate, date_end: NaiveDate, ext: &str) -> String {
    format!("Ventas_Sucursal_{}_{}_al_{}.{}", branch, date_start, date_end, ext)
}

/// One typed cell of a report row.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Int(i64),
    Decimal(f64),
    Blank,
}

impl Cell {
    fn to_csv(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Decimal(f) => decimal(*f),
            Cell::Blank => String::new(),
        }
    }
}

/// Two decimals, comma separator.
fn decimal(value: f64) -> String {
    format!("{:.2}", value).replacen('.', ",", 1)
}

fn rank(value: usize) -> Cell {
    if value == 0 {
        Cell::Blank
    } else {
        Cell::Int(value as i64)
    }
}

fn cells(entry: &CombinedReportEntry) -> [Cell; 22] {
    [
        Cell::Text(entry.code.clone()),
        Cell::Text(entry.name.clone()),
        Cell::Text(entry.brand.clone()),
        Cell::Text(entry.category.clone()),
        Cell::Text(entry.dimensions.clone()),
        Cell::Decimal(entry.packing),
        Cell::Decimal(entry.avg_cif_usd),
        Cell::Decimal(entry.quantity_sold),
        Cell::Int(entry.transaction_count),
        Cell::Decimal(entry.percent_sold),
        Cell::Int(entry.base_price_clp),
        Cell::Int(entry.offer_price_clp),
        Cell::Int(entry.avg_sale_price_clp),
        Cell::Text(entry.last_receipt_date.clone()),
        Cell::Text(entry.last_sale_date.clone()),
        Cell::Decimal(entry.quantity_received),
        Cell::Text(entry.first_receipt_date.clone()),
        Cell::Int(entry.days_in_stock),
        Cell::Int(entry.total_sale_value_clp),
        Cell::Int(entry.profit_clp.round() as i64),
        rank(entry.rank_by_quantity),
        rank(entry.rank_by_value),
    ]
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, ReportError> {
    writer
        .into_inner()
        .map_err(|e| ReportError::Export(csv::Error::from(e.into_error())))
}

/// Writes matched entries, then unmatched ones, as CSV bytes.
pub fn export_to_csv(report: &CombinedReport) -> Result<Vec<u8>, ReportError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(std::iter::once(STATUS_COLUMN).chain(COLUMNS))?;
    for entry in report.matched.iter().chain(&report.unmatched) {
        let row = cells(entry);
        writer.write_record(
            std::iter::once(entry.status.label().to_string()).chain(row.iter().map(Cell::to_csv)),
        )?;
    }
    writer.flush().map_err(csv::Error::from)?;
    finish(writer)
}

/// Raw source rows as CSV, columns in the order the first row carries them.
/// No rows gives an empty file.
pub fn rows_to_csv(rows: &[RawRow]) -> Result<Vec<u8>, ReportError> {
    let mut writer = Writer::from_writer(Vec::new());
    let Some(first) = rows.first() else {
        return finish(writer);
    };
    let labels: Vec<&str> = first.keys().map(String::as_str).collect();
    writer.write_record(&labels)?;

    for row in rows {
        writer.write_record(labels.iter().map(|label| match row.get(*label) {
            Some(value) if DECIMAL_LABELS.contains(label) => coerce_number(value)
                .map(decimal)
                .or_else(|| coerce_text(value))
                .unwrap_or_default(),
            Some(value) => coerce_text(value).unwrap_or_default(),
            None => String::new(),
        }))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    finish(writer)
}

fn write_sheet(workbook: &mut Workbook, name: &str, entries: &[CombinedReportEntry]) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet().set_name(name)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (idx, entry) in entries.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in cells(entry).iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
                Cell::Int(i) => {
                    sheet.write_number(row, col, *i as f64)?;
                }
                Cell::Decimal(f) => {
                    sheet.write_number(row, col, *f)?;
                }
                Cell::Blank => {}
            }
        }
    }
    Ok(())
}

/// Two-sheet workbook of plain typed cells: matched entries, then sales
/// without inventory.
pub fn export_to_xlsx(report: &CombinedReport) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, MATCHED_SHEET, &report.matched)?;
    write_sheet(&mut workbook, UNMATCHED_SHEET, &report.unmatched)?;
    Ok(workbook.save_to_buffer()?)
}
