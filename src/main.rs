use rotacion_report::{
    api, create_mysql_pool, sqlserver_config, AppConfig, MySqlInventory, ReportService, SqlServerSales,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let pool = create_mysql_pool(&config.mysql.url, config.mysql.max_connections).await?;
    info!("MySQL pool created");

    let inventory = Arc::new(MySqlInventory::new(pool));
    let sales = Arc::new(SqlServerSales::new(sqlserver_config(&config.sqlserver)));
    let service = Arc::new(ReportService::new(inventory, sales));

    let app = api::router(api::AppState {
        service,
        default_branch: config.report.default_branch,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET /api/reporte/combinado      - combined report (JSON)");
    info!("  GET /api/reporte/combinado/csv  - combined report (CSV)");
    info!("  GET /api/reporte/combinado/excel - combined report (xlsx)");
    info!("  GET /api/inventario             - inventory records");
    info!("  GET /api/inventario/csv         - inventory rows (CSV)");
    info!("  GET /api/ventas                 - sales records");
    info!("  GET /api/ventas/csv             - sales rows (CSV)");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
