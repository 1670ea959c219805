use crate::models::{CombinedReportEntry, EntryStatus};

/// `sold / received * 100`, or 0 unless both are positive. Not clamped: an
/// oversold product reports more than 100.
pub fn percent_sold(quantity_sold: f64, quantity_received: f64) -> f64 {
    if quantity_received > 0.0 && quantity_sold > 0.0 {
        quantity_sold / quantity_received * 100.0
    } else {
        0.0
    }
}

/// Sale value minus the inventory cost of what was sold. May be negative.
pub fn profit(total_sale_value: f64, quantity_sold: f64, avg_unit_cost: f64) -> f64 {
    total_sale_value - quantity_sold * avg_unit_cost
}

/// Fills the derived fields of an entry according to its status.
///
/// Sales-only entries have nothing received, so they are reported as fully
/// sold through with the whole sale value as profit.
pub fn apply_metrics(entry: &mut CombinedReportEntry) {
    match entry.status {
        EntryStatus::Matched => {
            entry.percent_sold = percent_sold(entry.quantity_sold, entry.quantity_received);
            entry.profit_clp = profit(
                entry.total_sale_value_clp as f64,
                entry.quantity_sold,
                entry.avg_unit_cost_clp,
            );
        }
        EntryStatus::Unmatched => {
            entry.quantity_received = 0.0;
            entry.percent_sold = 100.0;
            entry.profit_clp = entry.total_sale_value_clp as f64;
        }
    }
}
