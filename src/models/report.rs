use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{InventoryRecord, SalesRecord};
use crate::error::ReportError;

/// How an inventory code found its sales counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Normalized,
    Substring,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Normalized => write!(f, "normalized"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

/// Lifecycle state of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Driven by an inventory record (sales fields may be zero).
    Matched,
    /// Sales-only, no inventory counterpart.
    Unmatched,
}

impl EntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched => "COINCIDENTE",
            Self::Unmatched => "SIN COINCIDENCIA",
        }
    }
}

/// Optional ordering of the matched set in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrder {
    /// Inventory order (first-seen code order).
    #[default]
    Source,
    Quantity,
    Value,
    Code,
}

impl ReportOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "source" | "origen" => Some(Self::Source),
            "quantity" | "cantidad" => Some(Self::Quantity),
            "value" | "venta" => Some(Self::Value),
            "code" | "codigo" => Some(Self::Code),
            _ => None,
        }
    }
}

/// Combined inventory x sales row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedReportEntry {
    #[serde(rename = "ESTADO")]
    pub status: EntryStatus,
    #[serde(rename = "Codigo_Producto")]
    pub code: String,
    #[serde(rename = "MARCA")]
    pub brand: String,
    #[serde(rename = "CATEGORIA")]
    pub category: String,
    #[serde(rename = "DIMENSIONES")]
    pub dimensions: String,
    #[serde(rename = "NOMBRE")]
    pub name: String,
    #[serde(rename = "PACKING")]
    pub packing: f64,

    #[serde(rename = "CIF_PROMEDIO_USD")]
    pub avg_cif_usd: f64,
    #[serde(rename = "CIF_PROMEDIO_CLP")]
    pub avg_unit_cost_clp: f64,
    #[serde(rename = "CANTIDAD_INGRESADA")]
    pub quantity_received: f64,
    #[serde(rename = "CANTIDAD_DE_DIAS_EN_INVENTARIO")]
    pub days_in_stock: i64,
    #[serde(rename = "FECHA_PRIMER_INGRESO")]
    pub first_receipt_date: String,
    #[serde(rename = "FECHA_ULTIMO_INGRESO")]
    pub last_receipt_date: String,
    #[serde(rename = "CANTIDAD_INGRESOS")]
    pub receipt_count: i64,
    #[serde(rename = "HISTORIAL_INGRESOS")]
    pub receipt_history: String,

    #[serde(rename = "PRECIO_PRODUCTO_CLP")]
    pub base_price_clp: i64,
    #[serde(rename = "PRECIO_OFERTA_CLP")]
    pub offer_price_clp: i64,
    #[serde(rename = "PROMEDIO_DEL_PRECIO_VENTA_CLP")]
    pub avg_sale_price_clp: i64,
    #[serde(rename = "CANTIDAD_VENDIDA")]
    pub quantity_sold: f64,
    #[serde(rename = "VENTA_NETA_TOTAL_CLP")]
    pub total_sale_value_clp: i64,
    #[serde(rename = "ULTIMA_FECHA_VENTA")]
    pub last_sale_date: String,
    #[serde(rename = "CANTIDAD_TRANSACCIONES")]
    pub transaction_count: i64,

    #[serde(rename = "PORCENTAJE_VENDIDO")]
    pub percent_sold: f64,
    #[serde(rename = "UTILIDAD_CLP")]
    pub profit_clp: f64,
    #[serde(rename = "RANKING_POR_CANTIDAD_VENDIDA")]
    pub rank_by_quantity: usize,
    #[serde(rename = "RANKING_VENTA")]
    pub rank_by_value: usize,

    #[serde(rename = "METODO_COINCIDENCIA")]
    pub match_method: Option<MatchMethod>,
    #[serde(rename = "CODIGO_VENTAS")]
    pub matched_sales_code: Option<String>,
}

impl CombinedReportEntry {
    /// Entry driven by an inventory record; sales fields stay zero when
    /// `sales` is `None`. Derived metrics are filled in later.
    pub fn from_inventory(inv: &InventoryRecord, sales: Option<(&SalesRecord, MatchMethod)>) -> Self {
        let mut entry = Self {
            status: EntryStatus::Matched,
            code: inv.code.clone(),
            brand: inv.brand.clone(),
            category: inv.category.clone(),
            dimensions: inv.dimensions.clone(),
            name: inv.customs_name.clone(),
            packing: inv.packing,
            avg_cif_usd: inv.avg_cif_usd,
            avg_unit_cost_clp: inv.avg_unit_cost_clp,
            quantity_received: inv.units_received,
            days_in_stock: inv.days_in_stock,
            first_receipt_date: inv.first_receipt_date.clone(),
            last_receipt_date: inv.last_receipt_date.clone(),
            receipt_count: inv.receipt_count,
            receipt_history: inv.receipt_history.clone(),
            base_price_clp: 0,
            offer_price_clp: 0,
            avg_sale_price_clp: 0,
            quantity_sold: 0.0,
            total_sale_value_clp: 0,
            last_sale_date: String::new(),
            transaction_count: 0,
            percent_sold: 0.0,
            profit_clp: 0.0,
            rank_by_quantity: 0,
            rank_by_value: 0,
            match_method: None,
            matched_sales_code: None,
        };

        if let Some((s, method)) = sales {
            entry.apply_sales(s);
            entry.match_method = Some(method);
            entry.matched_sales_code = Some(s.code.clone());
        }
        entry
    }

    /// Sales-only entry.
    pub fn from_sales(s: &SalesRecord) -> Self {
        let mut entry = Self::from_inventory(
            &InventoryRecord {
                code: s.code.clone(),
                customs_name: s.product_name.clone(),
                ..InventoryRecord::default()
            },
            None,
        );
        entry.status = EntryStatus::Unmatched;
        entry.apply_sales(s);
        entry
    }

    fn apply_sales(&mut self, s: &SalesRecord) {
        self.base_price_clp = s.base_price_clp;
        self.offer_price_clp = s.offer_price_clp;
        self.avg_sale_price_clp = s.avg_sale_price_clp;
        self.quantity_sold = s.quantity_sold;
        self.total_sale_value_clp = s.total_sale_value_clp;
        self.last_sale_date = s.last_sale_date.clone();
        self.transaction_count = s.transaction_count;
    }
}

/// Counters for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    pub inventory_rows: usize,
    pub sales_rows: usize,
    pub inventory_codes: usize,
    pub sales_codes: usize,
    pub matched_exact: usize,
    pub matched_normalized: usize,
    pub matched_substring: usize,
    pub inventory_without_sales: usize,
    pub unmatched_sales: usize,
}

impl ReportStats {
    pub fn matches(&self) -> usize {
        self.matched_exact + self.matched_normalized + self.matched_substring
    }

    pub fn record(&mut self, method: Option<MatchMethod>) {
        match method {
            Some(MatchMethod::Exact) => self.matched_exact += 1,
            Some(MatchMethod::Normalized) => self.matched_normalized += 1,
            Some(MatchMethod::Substring) => self.matched_substring += 1,
            None => self.inventory_without_sales += 1,
        }
    }
}

/// Output of the reconciliation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedReport {
    pub matched: Vec<CombinedReportEntry>,
    pub unmatched: Vec<CombinedReportEntry>,
    pub stats: ReportStats,
}

pub const DEFAULT_BRANCH: i32 = 211;

/// Resolved request filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub year: i32,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub branch: i32,
    /// Substring filter on product code; empty means all codes.
    pub code_filter: String,
    pub order: ReportOrder,
}

impl ReportFilter {
    /// Whole calendar year for `year`.
    pub fn for_year(year: i32, branch: i32) -> Result<Self, ReportError> {
        let (date_start, date_end) = year_bounds(year)?;
        Ok(Self {
            year,
            date_start,
            date_end,
            branch,
            code_filter: String::new(),
            order: ReportOrder::Source,
        })
    }

    /// Builds a filter from loosely-typed request parameters.
    ///
    /// Missing year falls back to `today`'s year, missing dates to the bounds
    /// of that year, and a missing or non-positive branch to `default_branch`.
    pub fn from_params(
        params: &FilterParams,
        default_branch: i32,
        today: NaiveDate,
    ) -> Result<Self, ReportError> {
        let year = parse_or(params.year.as_deref(), today.year());
        let branch = match parse_or(params.branch.as_deref(), default_branch) {
            b if b <= 0 => default_branch,
            b => b,
        };
        let (year_start, year_end) = year_bounds(year)?;
        let date_start = parse_date(params.date_start.as_deref(), "fechaInicio")?.unwrap_or(year_start);
        let date_end = parse_date(params.date_end.as_deref(), "fechaFin")?.unwrap_or(year_end);
        if date_start > date_end {
            return Err(ReportError::InvalidFilter(format!(
                "fechaInicio {date_start} is after fechaFin {date_end}"
            )));
        }

        let order = match params.order.as_deref() {
            None => ReportOrder::Source,
            Some(raw) => ReportOrder::parse(raw)
                .ok_or_else(|| ReportError::InvalidFilter(format!("unknown orden '{raw}'")))?,
        };

        Ok(Self {
            year,
            date_start,
            date_end,
            branch,
            code_filter: params.code.as_deref().unwrap_or_default().trim().to_string(),
            order,
        })
    }
}

/// Raw query-string parameters, named as the HTTP surface exposes them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(rename = "anio")]
    pub year: Option<String>,
    #[serde(rename = "fechaInicio")]
    pub date_start: Option<String>,
    #[serde(rename = "fechaFin")]
    pub date_end: Option<String>,
    #[serde(rename = "sucursal")]
    pub branch: Option<String>,
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "orden")]
    pub order: Option<String>,
}

impl FilterParams {
    /// Both `fechaInicio` and `fechaFin` must be given.
    pub fn require_period(&self) -> Result<(), ReportError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|d| !d.trim().is_empty());
        if present(&self.date_start) && present(&self.date_end) {
            Ok(())
        } else {
            Err(ReportError::InvalidFilter(
                "fechaInicio and fechaFin are required".to_string(),
            ))
        }
    }
}

fn parse_or(value: Option<&str>, default: i32) -> i32 {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_date(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, ReportError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ReportError::InvalidFilter(format!("{name} '{v}' is not a YYYY-MM-DD date"))),
    }
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), ReportError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    start
        .zip(end)
        .ok_or_else(|| ReportError::InvalidFilter(format!("anio {year} is out of range")))
}
