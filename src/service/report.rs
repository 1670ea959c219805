use std::sync::Arc;
use std::time::Instant;

use super::index::ProductIndex;
use super::matcher::{match_sales, orphan_sales, MatchObserver, TracingObserver};
use super::metrics::apply_metrics;
use super::ranker::{assign_ranks, sort_entries};
use crate::db::{InventorySource, SalesSource};
use crate::error::ReportError;
use crate::models::{
    CombinedReport, CombinedReportEntry, InventoryRecord, RawRow, ReportFilter, ReportOrder,
    ReportStats, SalesRecord,
};

/// Typed records out of raw rows; rows without a code are dropped.
fn to_records<T>(source: &'static str, rows: &[RawRow], parse: fn(&RawRow) -> Option<T>) -> Vec<T> {
    let records: Vec<T> = rows.iter().filter_map(parse).collect();
    let skipped = rows.len() - records.len();
    if skipped > 0 {
        tracing::warn!(source, skipped, "rows without a product code were ignored");
    }
    records
}

pub fn inventory_records(rows: &[RawRow]) -> Vec<InventoryRecord> {
    to_records("inventory", rows, InventoryRecord::from_raw)
}

pub fn sales_records(rows: &[RawRow]) -> Vec<SalesRecord> {
    to_records("sales", rows, SalesRecord::from_raw)
}

/// Reconciliation over raw rows from both sources.
pub fn reconcile(
    inventory_rows: &[RawRow],
    sales_rows: &[RawRow],
    order: ReportOrder,
    observer: &dyn MatchObserver,
) -> CombinedReport {
    let mut report = reconcile_records(
        inventory_records(inventory_rows),
        sales_records(sales_rows),
        order,
        observer,
    );
    report.stats.inventory_rows = inventory_rows.len();
    report.stats.sales_rows = sales_rows.len();
    report
}

/// Inventory x sales join.
///
/// Every inventory code yields exactly one matched entry (zero sales fields
/// when nothing matches). Sales codes that no inventory code reaches by exact
/// or normalized matching become unmatched entries. Ranks are assigned over
/// the matched set only.
pub fn reconcile_records(
    inventory: Vec<InventoryRecord>,
    sales: Vec<SalesRecord>,
    order: ReportOrder,
    observer: &dyn MatchObserver,
) -> CombinedReport {
    let mut stats = ReportStats {
        inventory_rows: inventory.len(),
        sales_rows: sales.len(),
        ..ReportStats::default()
    };

    let inventory_index = ProductIndex::build("inventory", inventory);
    let sales_index = ProductIndex::build("sales", sales);
    stats.inventory_codes = inventory_index.len();
    stats.sales_codes = sales_index.len();

    let mut matched: Vec<CombinedReportEntry> = inventory_index
        .iter()
        .map(|(code, inv)| {
            let found = match_sales(code, &sales_index, observer);
            stats.record(found.map(|(_, method)| method));
            let mut entry = CombinedReportEntry::from_inventory(inv, found);
            apply_metrics(&mut entry);
            entry
        })
        .collect();

    let unmatched: Vec<CombinedReportEntry> = orphan_sales(&sales_index, &inventory_index, observer)
        .into_iter()
        .map(|sale| {
            let mut entry = CombinedReportEntry::from_sales(sale);
            apply_metrics(&mut entry);
            entry
        })
        .collect();
    stats.unmatched_sales = unmatched.len();

    assign_ranks(&mut matched);
    sort_entries(&mut matched, order);

    CombinedReport {
        matched,
        unmatched,
        stats,
    }
}

/// Combined report service over the two data sources.
pub struct ReportService {
    inventory: Arc<dyn InventorySource>,
    sales: Arc<dyn SalesSource>,
}

impl ReportService {
    pub fn new(inventory: Arc<dyn InventorySource>, sales: Arc<dyn SalesSource>) -> Self {
        Self { inventory, sales }
    }

    /// Inventory rows for the year, filtered by code substring.
    pub async fn inventory_rows(&self, year: i32, code_filter: &str) -> Result<Vec<RawRow>, ReportError> {
        self.inventory
            .fetch_inventory(year, code_filter)
            .await
            .map_err(|source| ReportError::Inventory { source })
    }

    /// Aggregated sales rows for the filter's period and branch.
    pub async fn sales_rows(&self, filter: &ReportFilter) -> Result<Vec<RawRow>, ReportError> {
        self.sales
            .fetch_sales(filter.date_start, filter.date_end, filter.branch, &filter.code_filter)
            .await
            .map_err(|source| ReportError::Sales { source })
    }

    pub async fn generate_combined_report(&self, filter: &ReportFilter) -> Result<CombinedReport, ReportError> {
        self.generate_combined_report_with(filter, &TracingObserver).await
    }

    /// Fetches both sources concurrently, then reconciles.
    ///
    /// When both fetches fail the sales error is reported.
    pub async fn generate_combined_report_with(
        &self,
        filter: &ReportFilter,
        observer: &(dyn MatchObserver + Sync),
    ) -> Result<CombinedReport, ReportError> {
        let start = Instant::now();
        let (sales_rows, inventory_rows) = futures::future::join(
            self.sales_rows(filter),
            self.inventory_rows(filter.year, &filter.code_filter),
        )
        .await;

        let sales_rows = sales_rows.inspect_err(|e| tracing::error!("combined report aborted: {}", e))?;
        let inventory_rows =
            inventory_rows.inspect_err(|e| tracing::error!("combined report aborted: {}", e))?;
        let fetch_elapsed = start.elapsed();

        tracing::info!(
            sales = sales_rows.len(),
            inventory = inventory_rows.len(),
            "fetched rows in {:?}",
            fetch_elapsed
        );

        let report = reconcile(&inventory_rows, &sales_rows, filter.order, observer);
        let s = &report.stats;
        tracing::info!(
            "combined report: inventory codes {}, sales codes {}, matches {} (exact {}, normalized {}, substring {}), without sales {}, unmatched sales {}, took {:?}",
            s.inventory_codes,
            s.sales_codes,
            s.matches(),
            s.matched_exact,
            s.matched_normalized,
            s.matched_substring,
            s.inventory_without_sales,
            s.unmatched_sales,
            start.elapsed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryStatus, MatchMethod};
    use crate::service::matcher::NoopObserver;

    fn inv(code: &str, received: f64, unit_cost: f64) -> InventoryRecord {
        InventoryRecord {
            code: code.into(),
            units_received: received,
            avg_unit_cost_clp: unit_cost,
            ..InventoryRecord::default()
        }
    }

    fn sale(code: &str, sold: f64, total: i64) -> SalesRecord {
        SalesRecord {
            code: code.into(),
            quantity_sold: sold,
            total_sale_value_clp: total,
            ..SalesRecord::default()
        }
    }

    #[test]
    fn single_exact_match() {
        let report = reconcile_records(
            vec![inv("A1", 100.0, 5.0)],
            vec![sale("A1", 40.0, 800)],
            ReportOrder::Source,
            &NoopObserver,
        );
        assert_eq!(report.matched.len(), 1);
        assert!(report.unmatched.is_empty());
        let e = &report.matched[0];
        assert_eq!(e.percent_sold, 40.0);
        assert_eq!(e.profit_clp, 600.0);
        assert_eq!(e.rank_by_quantity, 1);
        assert_eq!(e.rank_by_value, 1);
        assert_eq!(e.match_method, Some(MatchMethod::Exact));
        assert_eq!(report.stats.matched_exact, 1);
    }

    #[test]
    fn sales_only_goes_to_unmatched() {
        let report = reconcile_records(vec![], vec![sale("B2", 10.0, 200)], ReportOrder::Source, &NoopObserver);
        assert!(report.matched.is_empty());
        assert_eq!(report.unmatched.len(), 1);
        let e = &report.unmatched[0];
        assert_eq!(e.code, "B2");
        assert_eq!(e.status, EntryStatus::Unmatched);
        assert_eq!(e.percent_sold, 100.0);
        assert_eq!(e.profit_clp, 200.0);
        assert_eq!(e.rank_by_quantity, 0);
    }

    #[test]
    fn duplicate_inventory_codes_keep_the_last_row() {
        let report = reconcile_records(
            vec![inv("D1", 10.0, 1.0), inv("D1", 50.0, 2.0)],
            vec![sale("D1", 5.0, 100)],
            ReportOrder::Source,
            &NoopObserver,
        );
        assert_eq!(report.matched.len(), 1);
        let e = &report.matched[0];
        assert_eq!(e.quantity_received, 50.0);
        assert_eq!(e.avg_unit_cost_clp, 2.0);
        assert_eq!(e.percent_sold, 10.0);
        assert_eq!(e.profit_clp, 90.0);
        assert_eq!(report.stats.inventory_rows, 2);
        assert_eq!(report.stats.inventory_codes, 1);
    }

    #[test]
    fn empty_sources_give_empty_report() {
        let report = reconcile(&[], &[], ReportOrder::Source, &NoopObserver);
        assert!(report.matched.is_empty());
        assert!(report.unmatched.is_empty());
        assert_eq!(report.stats, ReportStats::default());
    }
}
