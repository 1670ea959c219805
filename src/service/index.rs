use indexmap::IndexMap;
use std::collections::HashMap;

use super::normalize::normalize_code;
use crate::models::{InventoryRecord, SalesRecord};

/// Anything keyed by a product code.
pub trait Coded {
    fn code(&self) -> &str;
}

impl Coded for InventoryRecord {
    fn code(&self) -> &str {
        &self.code
    }
}

impl Coded for SalesRecord {
    fn code(&self) -> &str {
        &self.code
    }
}

/// Lookup structures over one source's records.
///
/// Duplicate exact codes are last-write-wins: the later record replaces the
/// earlier one and the code keeps its first-seen position in iteration order.
#[derive(Debug, Clone)]
pub struct ProductIndex<T> {
    by_exact_code: IndexMap<String, T>,
    /// normalized code -> original code
    by_normalized_code: HashMap<String, String>,
    sorted_codes: Vec<String>,
    overwritten: usize,
}

impl<T: Coded> ProductIndex<T> {
    pub fn build(source: &'static str, records: impl IntoIterator<Item = T>) -> Self {
        let mut by_exact_code: IndexMap<String, T> = IndexMap::new();
        let mut by_normalized_code = HashMap::new();
        let mut overwritten = 0;

        for record in records {
            let code = record.code().to_string();
            if code.trim().is_empty() {
                tracing::warn!(source, "skipping record with a blank product code");
                continue;
            }

            by_normalized_code.insert(normalize_code(&code), code.clone());
            if by_exact_code.insert(code.clone(), record).is_some() {
                overwritten += 1;
                tracing::debug!(source, code = %code, "duplicate product code, keeping the later row");
            }
        }

        let mut sorted_codes: Vec<String> = by_exact_code.keys().cloned().collect();
        sorted_codes.sort();

        Self {
            by_exact_code,
            by_normalized_code,
            sorted_codes,
            overwritten,
        }
    }

    pub fn get(&self, code: &str) -> Option<&T> {
        self.by_exact_code.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_exact_code.contains_key(code)
    }

    /// Original code registered under a normalized code.
    pub fn original_code(&self, normalized: &str) -> Option<&str> {
        self.by_normalized_code.get(normalized).map(String::as_str)
    }

    pub fn contains_normalized(&self, normalized: &str) -> bool {
        self.by_normalized_code.contains_key(normalized)
    }

    /// Records in first-seen code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.by_exact_code.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Records in ascending code order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &T)> {
        self.sorted_codes
            .iter()
            .filter_map(|code| self.by_exact_code.get(code).map(|rec| (code.as_str(), rec)))
    }

    pub fn len(&self) -> usize {
        self.by_exact_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_exact_code.is_empty()
    }

    /// Rows that were replaced by a later row with the same code.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(code: &str, qty: f64) -> SalesRecord {
        SalesRecord {
            code: code.into(),
            quantity_sold: qty,
            ..SalesRecord::default()
        }
    }

    #[test]
    fn exact_and_normalized_lookups() {
        let idx = ProductIndex::build("sales", vec![sale("ab-12", 1.0), sale("CER COR", 2.0)]);
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.get("ab-12").unwrap().quantity_sold, 1.0);
        assert_eq!(idx.original_code("AB12"), Some("ab-12"));
        assert_eq!(idx.original_code("CERCOR"), Some("CER COR"));
        assert!(idx.get("AB12").is_none());
    }

    #[test]
    fn duplicate_codes_overwrite_but_keep_position() {
        let idx = ProductIndex::build(
            "sales",
            vec![sale("B", 1.0), sale("A", 2.0), sale("B", 3.0)],
        );
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.overwritten(), 1);
        assert_eq!(idx.get("B").unwrap().quantity_sold, 3.0);
        let order: Vec<&str> = idx.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["B", "A"]);
        let sorted: Vec<&str> = idx.iter_sorted().map(|(c, _)| c).collect();
        assert_eq!(sorted, vec!["A", "B"]);
    }

    #[test]
    fn blank_codes_are_skipped() {
        let idx = ProductIndex::build("sales", vec![sale("", 1.0), sale("  ", 1.0), sale("X", 1.0)]);
        assert_eq!(idx.len(), 1);
        assert!(!idx.contains(""));
    }
}
