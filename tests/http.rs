mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use support::{inventory_row, sales_row, MemoryInventory, MemorySales};
use tower::ServiceExt;

fn sources() -> (Arc<MemoryInventory>, Arc<MemorySales>) {
    let inventory = Arc::new(MemoryInventory {
        rows: vec![inventory_row("A1", 100.0, 5.0)],
        ..MemoryInventory::default()
    });
    let sales = Arc::new(MemorySales {
        rows: vec![sales_row("A1", 40.0, 800), sales_row("B2", 10.0, 200)],
        ..MemorySales::default()
    });
    (inventory, sales)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn health() {
    let (inventory, sales) = sources();
    let (status, _, body) = get(support::app(inventory, sales), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn combined_report_json() {
    let (inventory, sales) = sources();
    let (status, _, body) = get(
        support::app(inventory, sales.clone()),
        "/api/reporte/combinado?anio=2024&sucursal=300",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    let matched = json["reportesCoincidentes"].as_array().unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["Codigo_Producto"], "A1");
    assert_eq!(matched[0]["PORCENTAJE_VENDIDO"], 40.0);
    assert_eq!(matched[0]["UTILIDAD_CLP"], 600.0);
    assert_eq!(matched[0]["RANKING_VENTA"], 1);

    let unmatched = json["reportesSinCoincidencia"].as_array().unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0]["Codigo_Producto"], "B2");
    assert_eq!(unmatched[0]["PORCENTAJE_VENDIDO"], 100.0);
    assert_eq!(json["stats"]["matched_exact"], 1);

    let calls = sales.calls.lock().unwrap();
    assert_eq!(calls[0].2, 300);
    assert_eq!(calls[0].0.to_string(), "2024-01-01");
}

#[tokio::test]
async fn invalid_dates_are_rejected() {
    let (inventory, sales) = sources();
    let (status, _, body) = get(
        support::app(inventory, sales.clone()),
        "/api/reporte/combinado?fechaInicio=2024-06-01&fechaFin=2024-01-01",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(sales.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_failure_is_a_server_error() {
    let inventory = Arc::new(MemoryInventory {
        fail: true,
        ..MemoryInventory::default()
    });
    let (_, sales) = sources();
    let (status, _, body) = get(support::app(inventory, sales), "/api/reporte/combinado?anio=2024").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("inventory"));
}

#[tokio::test]
async fn combined_report_csv_attachment() {
    let (inventory, sales) = sources();
    let (status, headers, body) = get(
        support::app(inventory, sales),
        "/api/reporte/combinado/csv?fechaInicio=2024-01-01&fechaFin=2024-03-31&anio=2024",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Reporte_Combinado_2024-01-01_2024-03-31.csv\""
    );

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("COINCIDENTE,A1,"));
    assert!(lines[2].starts_with("SIN COINCIDENCIA,B2,"));
}

#[tokio::test]
async fn inventory_endpoint_decodes_history() {
    let (inventory, sales) = sources();
    let (status, _, body) = get(support::app(inventory.clone(), sales), "/api/inventario?anio=2023&codigo=A").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total"], 1);
    let item = &json["data"][0];
    assert_eq!(item["code"], "A1");
    assert_eq!(item["receipt_history_parsed"][0]["Zeta"], "Z1");
    assert_eq!(*inventory.calls.lock().unwrap(), vec![(2023, "A".to_string())]);
}

#[tokio::test]
async fn sales_endpoint_lists_records() {
    let (inventory, sales) = sources();
    let (status, _, body) = get(support::app(inventory, sales), "/api/ventas?fechaInicio=2024-01-01&fechaFin=2024-01-31").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["data"][1]["code"], "B2");
    assert_eq!(json["data"][1]["quantity_sold"], 10.0);
}

#[tokio::test]
async fn sales_endpoint_needs_both_dates() {
    let (inventory, sales) = sources();
    let app = support::app(inventory, sales.clone());
    let (status, _, body) = get(app.clone(), "/api/ventas?fechaInicio=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("fechaFin"));

    let (status, _, _) = get(app, "/api/ventas/csv?fechaFin=2024-01-31").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(sales.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn combined_report_workbook_attachment() {
    let (inventory, sales) = sources();
    let (status, headers, body) = get(
        support::app(inventory, sales),
        "/api/reporte/combinado/excel?fechaInicio=2024-01-01&fechaFin=2024-03-31",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Reporte_Combinado_2024-01-01_2024-03-31.xlsx\""
    );
    assert!(body.starts_with(b"PK"));
}

#[tokio::test]
async fn inventory_csv_keeps_source_columns() {
    let (inventory, sales) = sources();
    let (status, headers, body) = get(
        support::app(inventory.clone(), sales),
        "/api/inventario/csv?anio=2023&codigo=A",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Inventario_2023_A.csv\""
    );

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Código de Producto,Nombre Aduanero,"));
    assert!(lines[1].starts_with("A1,PRODUCTO A1 20X60 CMS,ACME,CERAMICA,POR ASIGNAR,\"12,00\",\"100,00\",\"5,00\","));
    assert_eq!(*inventory.calls.lock().unwrap(), vec![(2023, "A".to_string())]);
}

#[tokio::test]
async fn sales_csv_names_branch_and_period() {
    let (inventory, sales) = sources();
    let (status, headers, body) = get(
        support::app(inventory, sales.clone()),
        "/api/ventas/csv?fechaInicio=2024-01-01&fechaFin=2024-01-31",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Ventas_Sucursal_211_2024-01-01_al_2024-01-31.csv\""
    );

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Código de Producto,Nombre del Producto,Cantidad Total Vendida,Total Ventas (CLP),Cantidad de Ventas Registradas",
            "A1,VENTA A1,\"40,00\",800,3",
            "B2,VENTA B2,\"10,00\",200,3",
        ]
    );
    assert_eq!(sales.calls.lock().unwrap()[0].2, 211);
}
