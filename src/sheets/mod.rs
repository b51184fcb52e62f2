//! Access to the remote spreadsheet.
//!
//! [`TableProvider`] is the seam to the service hosting the data; the
//! handles in [`client`] sequence its calls for one request and turn every
//! provider failure into a [`PipelineError`](crate::error::PipelineError).

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

use crate::data_types::{CellRange, RawRow, SpreadsheetInfo, TableInfo};

pub mod client;
pub mod google;
pub mod memory;

pub use client::{
    AuthorizedSpreadsheet, LoadedCells, LoadedSpreadsheet, RemoteSpreadsheet, Worksheet,
};
pub use google::GoogleSheetsProvider;
pub use memory::{FailurePoint, InMemoryProvider, ProviderCall};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service identity and private key. Field names match a downloaded
/// service-account key file, so such a file deserializes directly.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountCredentials {
    pub fn new(client_email: impl Into<String>, private_key: impl Into<String>) -> Self {
        ServiceAccountCredentials {
            client_email: client_email.into(),
            private_key: private_key.into(),
            token_uri: default_token_uri(),
        }
    }
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Raw calls against the service hosting the spreadsheet.
///
/// Handlers run on actix's single-threaded workers, so the futures need not
/// be `Send`.
#[async_trait(?Send)]
pub trait TableProvider: 'static {
    /// Authorization state established by [`TableProvider::authenticate`].
    type Session;
    type Error: std::error::Error + 'static;

    async fn authenticate(
        &self,
        credentials: &ServiceAccountCredentials,
    ) -> Result<Self::Session, Self::Error>;

    async fn spreadsheet_info(
        &self,
        session: &Self::Session,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, Self::Error>;

    /// Every row of the table, header row included.
    async fn table_values(
        &self,
        session: &Self::Session,
        spreadsheet_id: &str,
        table: &TableInfo,
    ) -> Result<Vec<RawRow>, Self::Error>;

    /// Formatted values of `range`, row-major from the range's top-left
    /// corner. Trailing blank cells and rows may be omitted.
    async fn formatted_range(
        &self,
        session: &Self::Session,
        spreadsheet_id: &str,
        table: &TableInfo,
        range: &CellRange,
    ) -> Result<Vec<RawRow>, Self::Error>;
}
