use std::time::Duration;

use crate::data_types::CellRange;

/// Terminal failure of one pipeline. The `Display` output is the message
/// handed to the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("auth error: {0}")]
    Authentication(String),

    #[error("metadata load error: {0}")]
    MetadataLoad(String),

    #[error("table selection error: {0}")]
    TableSelection(String),

    #[error("row load error: {0}")]
    RowFetch(String),

    /// The provider detail is kept for logs only.
    #[error("range load error: {range}")]
    CellRangeLoad { range: CellRange, detail: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
