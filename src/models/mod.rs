pub mod inventory;
pub mod raw;
pub mod report;
pub mod sales;

pub use inventory::{parse_history, InventoryRecord};
pub use raw::{coerce_number, coerce_text, FieldReader, RawRow, RawValue};
pub use report::{
    CombinedReport, CombinedReportEntry, EntryStatus, FilterParams, MatchMethod, ReportFilter,
    ReportOrder, ReportStats, DEFAULT_BRANCH,
};
pub use sales::SalesRecord;
