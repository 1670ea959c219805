use super::index::ProductIndex;
use super::normalize::normalize_code;
use crate::models::{InventoryRecord, MatchMethod, SalesRecord};

/// Receives one event per match attempt. The matcher itself never logs.
pub trait MatchObserver {
    /// `sales_code` is `Some` when `method` succeeded for `inventory_code`.
    fn on_attempt(&self, inventory_code: &str, method: MatchMethod, sales_code: Option<&str>);

    /// No strategy found a sales record for `inventory_code`.
    fn on_no_match(&self, _inventory_code: &str) {}

    /// `sales_code` has no inventory counterpart.
    fn on_orphan(&self, _sales_code: &str) {}
}

/// Emits attempts as `debug` events under the `rotacion_report::matcher` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_attempt(&self, inventory_code: &str, method: MatchMethod, sales_code: Option<&str>) {
        tracing::debug!(
            target: "rotacion_report::matcher",
            inventory_code,
            %method,
            sales_code = sales_code.unwrap_or(""),
            hit = sales_code.is_some(),
            "match attempt"
        );
    }

    fn on_no_match(&self, inventory_code: &str) {
        tracing::debug!(target: "rotacion_report::matcher", inventory_code, "no sales counterpart");
    }

    fn on_orphan(&self, sales_code: &str) {
        tracing::debug!(target: "rotacion_report::matcher", sales_code, "sales code without inventory");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {
    fn on_attempt(&self, _: &str, _: MatchMethod, _: Option<&str>) {}
}

/// Finds the sales record for an inventory code.
///
/// Strategies run in order and stop at the first hit: exact code, normalized
/// code, then substring containment in either direction (case-insensitive)
/// over sales codes in ascending order.
pub fn match_sales<'a>(
    inventory_code: &str,
    sales: &'a ProductIndex<SalesRecord>,
    observer: &dyn MatchObserver,
) -> Option<(&'a SalesRecord, MatchMethod)> {
    if let Some(found) = sales.get(inventory_code) {
        observer.on_attempt(inventory_code, MatchMethod::Exact, Some(&found.code));
        return Some((found, MatchMethod::Exact));
    }
    observer.on_attempt(inventory_code, MatchMethod::Exact, None);

    let normalized = normalize_code(inventory_code);
    if let Some(found) = sales.original_code(&normalized).and_then(|code| sales.get(code)) {
        observer.on_attempt(inventory_code, MatchMethod::Normalized, Some(&found.code));
        return Some((found, MatchMethod::Normalized));
    }
    observer.on_attempt(inventory_code, MatchMethod::Normalized, None);

    let upper_inv = inventory_code.to_uppercase();
    let found = sales.iter_sorted().find_map(|(code, rec)| {
        let upper_sales = code.to_uppercase();
        (upper_inv.contains(&upper_sales) || upper_sales.contains(&upper_inv)).then_some(rec)
    });
    observer.on_attempt(
        inventory_code,
        MatchMethod::Substring,
        found.map(|rec| rec.code.as_str()),
    );
    if found.is_none() {
        observer.on_no_match(inventory_code);
    }
    found.map(|rec| (rec, MatchMethod::Substring))
}

/// True when `sales_code` is attached to some inventory code by exact or
/// normalized matching. Substring containment is not considered here.
pub fn has_inventory_counterpart(sales_code: &str, inventory: &ProductIndex<InventoryRecord>) -> bool {
    inventory.contains(sales_code) || inventory.contains_normalized(&normalize_code(sales_code))
}

/// Sales records with no inventory counterpart, in first-seen order.
pub fn orphan_sales<'a>(
    sales: &'a ProductIndex<SalesRecord>,
    inventory: &ProductIndex<InventoryRecord>,
    observer: &dyn MatchObserver,
) -> Vec<&'a SalesRecord> {
    sales
        .iter()
        .filter(|(code, _)| !has_inventory_counterpart(code, inventory))
        .map(|(code, rec)| {
            observer.on_orphan(code);
            rec
        })
        .collect()
}
