//! Account and working-fund data from a Google spreadsheet, served as JSON.

pub mod config;
pub mod data_types;
pub mod decode;
pub mod error;
pub mod http;
pub mod logging;
pub mod pipelines;
pub mod remote_data;
pub mod sheets;

pub use data_types::{CellAddress, CellRange, RawRow, TableSelector, WorkingFund};
pub use error::{PipelineError, PipelineResult};
pub use remote_data::RemoteData;
