pub mod handlers;

use axum::{routing::get, Router};
use tower::ServiceBuilder;

pub use handlers::*;

/// All HTTP routes over the shared report state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/reporte/combinado", get(combined_report))
        .route("/api/reporte/combinado/csv", get(combined_report_csv))
        .route("/api/reporte/combinado/excel", get(combined_report_excel))
        .route("/api/inventario", get(inventory))
        .route("/api/inventario/csv", get(inventory_csv))
        .route("/api/ventas", get(sales))
        .route("/api/ventas/csv", get(sales_csv))
        .with_state(state)
        .layer(ServiceBuilder::new())
}
