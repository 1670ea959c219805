pub mod inventory;
pub mod pool;
pub mod sales;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::BoxError;
use crate::models::RawRow;

pub use inventory::MySqlInventory;
pub use pool::{create_mysql_pool, sqlserver_config};
pub use sales::SqlServerSales;

/// Upstream provider of inventory rows, one per (code, package size).
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_inventory(&self, year: i32, code_filter: &str) -> Result<Vec<RawRow>, BoxError>;
}

/// Upstream provider of sales rows, pre-aggregated per product code.
#[async_trait]
pub trait SalesSource: Send + Sync {
    async fn fetch_sales(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
        branch: i32,
        code_filter: &str,
    ) -> Result<Vec<RawRow>, BoxError>;
}
