pub mod export;
pub mod index;
pub mod matcher;
pub mod metrics;
pub mod normalize;
pub mod ranker;
pub mod report;

pub use export::{
    export_file_name, export_to_csv, export_to_xlsx, inventory_file_name, rows_to_csv, sales_file_name,
};
pub use index::{Coded, ProductIndex};
pub use matcher::{MatchObserver, NoopObserver, TracingObserver};
pub use normalize::normalize_code;
pub use report::{reconcile, reconcile_records, ReportService};
