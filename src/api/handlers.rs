use crate::error::ReportError;
use crate::models::{
    parse_history, CombinedReportEntry, FilterParams, InventoryRecord, ReportFilter, ReportStats,
    SalesRecord,
};
use crate::service::{
    export_file_name, export_to_csv, export_to_xlsx, inventory_file_name, report, rows_to_csv,
    sales_file_name, ReportService,
};
use axum::{
    extract::{Json, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
    pub default_branch: i32,
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CombinedReportResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "reportesCoincidentes")]
    pub matched: Vec<CombinedReportEntry>,
    #[serde(rename = "reportesSinCoincidencia")]
    pub unmatched: Vec<CombinedReportEntry>,
    pub stats: ReportStats,
}

/// Inventory record with its receipt history decoded when possible.
#[derive(Debug, Serialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub record: InventoryRecord,
    pub receipt_history_parsed: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse<T> {
    pub success: bool,
    pub message: String,
    pub total: usize,
    pub data: Vec<T>,
}

impl<T> RecordsResponse<T> {
    fn new(source: &str, data: Vec<T>) -> Self {
        Self {
            success: true,
            message: format!("{} {} records", data.len(), source),
            total: data.len(),
            data,
        }
    }
}

fn error_response(e: ReportError) -> Response {
    let status = if e.is_client_error() {
        tracing::warn!("rejected request: {}", e);
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let response = MessageResponse {
        success: false,
        message: format!("Error: {}", e),
    };
    (status, Json(response)).into_response()
}

fn resolve_filter(state: &AppState, params: &FilterParams) -> Result<ReportFilter, ReportError> {
    ReportFilter::from_params(params, state.default_branch, chrono::Local::now().date_naive())
}

/// Sales endpoints take no year fallback for the period.
fn resolve_sales_filter(state: &AppState, params: &FilterParams) -> Result<ReportFilter, ReportError> {
    params.require_period()?;
    resolve_filter(state, params)
}

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn attachment(content_type: &str, file_name: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        bytes,
    )
        .into_response()
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Combined inventory x sales report as JSON.
pub async fn combined_report(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state.service.generate_combined_report(&filter).await {
        Ok(report) => {
            let response = CombinedReportResponse {
                success: true,
                message: format!(
                    "{} inventory entries ({} with sales), {} sales without inventory",
                    report.matched.len(),
                    report.stats.matches(),
                    report.unmatched.len()
                ),
                matched: report.matched,
                unmatched: report.unmatched,
                stats: report.stats,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Combined report as a CSV attachment.
pub async fn combined_report_csv(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state
        .service
        .generate_combined_report(&filter)
        .await
        .and_then(|report| export_to_csv(&report))
    {
        Ok(bytes) => attachment(
            CSV_CONTENT_TYPE,
            &export_file_name(filter.date_start, filter.date_end, "csv"),
            bytes,
        ),
        Err(e) => error_response(e),
    }
}

/// Combined report as a two-sheet workbook.
pub async fn combined_report_excel(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state
        .service
        .generate_combined_report(&filter)
        .await
        .and_then(|report| export_to_xlsx(&report))
    {
        Ok(bytes) => attachment(
            XLSX_CONTENT_TYPE,
            &export_file_name(filter.date_start, filter.date_end, "xlsx"),
            bytes,
        ),
        Err(e) => {
            tracing::error!("workbook export failed: {}", e);
            error_response(e)
        }
    }
}

/// Inventory records for a production year.
pub async fn inventory(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state.service.inventory_rows(filter.year, &filter.code_filter).await {
        Ok(rows) => {
            let items: Vec<InventoryItem> = report::inventory_records(&rows)
                .into_iter()
                .map(|record| InventoryItem {
                    receipt_history_parsed: parse_history(&record.receipt_history),
                    record,
                })
                .collect();
            (StatusCode::OK, Json(RecordsResponse::new("inventory", items))).into_response()
        }
        Err(e) => {
            tracing::error!("inventory request failed: {}", e);
            error_response(e)
        }
    }
}

/// Aggregated sales records for a period and branch.
pub async fn sales(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_sales_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state.service.sales_rows(&filter).await {
        Ok(rows) => {
            let records: Vec<SalesRecord> = report::sales_records(&rows);
            (StatusCode::OK, Json(RecordsResponse::new("sales", records))).into_response()
        }
        Err(e) => {
            tracing::error!("sales request failed: {}", e);
            error_response(e)
        }
    }
}

/// Raw inventory rows as a CSV attachment.
pub async fn inventory_csv(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state
        .service
        .inventory_rows(filter.year, &filter.code_filter)
        .await
        .and_then(|rows| rows_to_csv(&rows))
    {
        Ok(bytes) => attachment(
            CSV_CONTENT_TYPE,
            &inventory_file_name(filter.year, &filter.code_filter, "csv"),
            bytes,
        ),
        Err(e) => error_response(e),
    }
}

/// Raw sales rows as a CSV attachment.
pub async fn sales_csv(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let filter = match resolve_sales_filter(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state.service.sales_rows(&filter).await.and_then(|rows| rows_to_csv(&rows)) {
        Ok(bytes) => attachment(
            CSV_CONTENT_TYPE,
            &sales_file_name(filter.branch, filter.date_start, filter.date_end, "csv"),
            bytes,
        ),
        Err(e) => error_response(e),
    }
}
