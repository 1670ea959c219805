use thiserror::Error;

/// Boxed error returned by the data sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to fetch inventory data: {source}")]
    Inventory {
        #[source]
        source: BoxError,
    },

    #[error("failed to fetch sales data: {source}")]
    Sales {
        #[source]
        source: BoxError,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("failed to write export: {0}")]
    Export(#[from] csv::Error),

    #[error("failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

impl ReportError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ReportError::InvalidFilter(_))
    }
}
