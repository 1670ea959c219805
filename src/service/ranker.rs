use std::cmp::Ordering;

use crate::models::{CombinedReportEntry, ReportOrder};

fn by_quantity_desc(a: &CombinedReportEntry, b: &CombinedReportEntry) -> Ordering {
    b.quantity_sold.total_cmp(&a.quantity_sold)
}

fn by_value_desc(a: &CombinedReportEntry, b: &CombinedReportEntry) -> Ordering {
    b.total_sale_value_clp.cmp(&a.total_sale_value_clp)
}

/// Dense 1-based ranks for `entries` under `cmp`, ties kept in input order.
fn ranks(entries: &[CombinedReportEntry], cmp: fn(&CombinedReportEntry, &CombinedReportEntry) -> Ordering) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    // sort_by is stable
    order.sort_by(|&i, &j| cmp(&entries[i], &entries[j]));

    let mut ranks = vec![0; entries.len()];
    for (pos, idx) in order.into_iter().enumerate() {
        ranks[idx] = pos + 1;
    }
    ranks
}

/// Writes `rank_by_quantity` and `rank_by_value` without reordering `entries`.
pub fn assign_ranks(entries: &mut [CombinedReportEntry]) {
    let quantity = ranks(entries, by_quantity_desc);
    let value = ranks(entries, by_value_desc);
    for ((entry, q), v) in entries.iter_mut().zip(quantity).zip(value) {
        entry.rank_by_quantity = q;
        entry.rank_by_value = v;
    }
}

/// Reorders `entries` on request. `Source` leaves them untouched.
pub fn sort_entries(entries: &mut [CombinedReportEntry], order: ReportOrder) {
    match order {
        ReportOrder::Source => {}
        ReportOrder::Quantity => entries.sort_by_key(|e| e.rank_by_quantity),
        ReportOrder::Value => entries.sort_by_key(|e| e.rank_by_value),
        ReportOrder::Code => entries.sort_by(|a, b| a.code.cmp(&b.code)),
    }
}
