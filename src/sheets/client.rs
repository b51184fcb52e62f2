//! Per-request handles on one spreadsheet.
//!
//! Each step consumes the previous handle and returns the next, so a
//! pipeline cannot load metadata before authenticating or read rows before
//! selecting a table.

use log::{debug, warn};

use super::{ServiceAccountCredentials, TableProvider};
use crate::data_types::{CellAddress, CellRange, RawRow, SpreadsheetInfo, TableInfo, TableSelector};
use crate::error::{PipelineError, PipelineResult};

/// Leading rows of every table that hold column headers, not data.
const HEADER_ROWS: usize = 1;

pub struct RemoteSpreadsheet<'a, P: TableProvider> {
    provider: &'a P,
    spreadsheet_id: String,
}

impl<'a, P: TableProvider> RemoteSpreadsheet<'a, P> {
    pub fn new(provider: &'a P, spreadsheet_id: impl Into<String>) -> Self {
        RemoteSpreadsheet {
            provider,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub async fn authenticate(
        self,
        credentials: &ServiceAccountCredentials,
    ) -> PipelineResult<AuthorizedSpreadsheet<'a, P>> {
        let session = self
            .provider
            .authenticate(credentials)
            .await
            .map_err(|e| PipelineError::Authentication(e.to_string()))?;
        debug!(
            "Authenticated as {} for spreadsheet {}",
            credentials.client_email, self.spreadsheet_id
        );

        Ok(AuthorizedSpreadsheet {
            provider: self.provider,
            spreadsheet_id: self.spreadsheet_id,
            session,
        })
    }
}

pub struct AuthorizedSpreadsheet<'a, P: TableProvider> {
    provider: &'a P,
    spreadsheet_id: String,
    session: P::Session,
}

impl<'a, P: TableProvider> AuthorizedSpreadsheet<'a, P> {
    pub async fn load_metadata(self) -> PipelineResult<LoadedSpreadsheet<'a, P>> {
        let info = self
            .provider
            .spreadsheet_info(&self.session, &self.spreadsheet_id)
            .await
            .map_err(|e| PipelineError::MetadataLoad(e.to_string()))?;
        debug!(
            "Loaded metadata for '{}' ({} tables)",
            info.title,
            info.tables.len()
        );

        Ok(LoadedSpreadsheet {
            provider: self.provider,
            spreadsheet_id: self.spreadsheet_id,
            session: self.session,
            info,
        })
    }
}

pub struct LoadedSpreadsheet<'a, P: TableProvider> {
    provider: &'a P,
    spreadsheet_id: String,
    session: P::Session,
    info: SpreadsheetInfo,
}

impl<'a, P: TableProvider> LoadedSpreadsheet<'a, P> {
    pub fn info(&self) -> &SpreadsheetInfo {
        &self.info
    }

    pub fn select_table(self, selector: &TableSelector) -> PipelineResult<Worksheet<'a, P>> {
        let table = self
            .info
            .find(selector)
            .cloned()
            .ok_or_else(|| PipelineError::TableSelection(format!("no table {}", selector)))?;

        Ok(Worksheet {
            provider: self.provider,
            spreadsheet_id: self.spreadsheet_id,
            session: self.session,
            table,
        })
    }
}

pub struct Worksheet<'a, P: TableProvider> {
    provider: &'a P,
    spreadsheet_id: String,
    session: P::Session,
    table: TableInfo,
}

impl<'a, P: TableProvider> Worksheet<'a, P> {
    pub fn table(&self) -> &TableInfo {
        &self.table
    }

    /// Data rows in sheet order; the header row is not included.
    pub async fn fetch_all_rows(&self) -> PipelineResult<Vec<RawRow>> {
        let values = self
            .provider
            .table_values(&self.session, &self.spreadsheet_id, &self.table)
            .await
            .map_err(|e| PipelineError::RowFetch(e.to_string()))?;

        let rows: Vec<RawRow> = values.into_iter().skip(HEADER_ROWS).collect();
        debug!("Fetched {} rows from '{}'", rows.len(), self.table.title);
        Ok(rows)
    }

    pub async fn load_cell_range(self, range: CellRange) -> PipelineResult<LoadedCells> {
        let values = match self
            .provider
            .formatted_range(&self.session, &self.spreadsheet_id, &self.table, &range)
            .await
        {
            Ok(values) => values,
            Err(e) => {
                warn!("Loading {}!{} failed: {}", self.table.title, range, e);
                return Err(PipelineError::CellRangeLoad {
                    range,
                    detail: e.to_string(),
                });
            }
        };

        Ok(LoadedCells {
            table: self.table,
            range,
            values,
        })
    }
}

/// Cells of one range, readable once loaded.
#[derive(Debug, Clone)]
pub struct LoadedCells {
    table: TableInfo,
    range: CellRange,
    values: Vec<RawRow>,
}

impl LoadedCells {
    pub fn table(&self) -> &TableInfo {
        &self.table
    }

    pub fn range(&self) -> CellRange {
        self.range
    }

    /// Formatted value of a cell inside the loaded range. Blank cells read
    /// as an empty string.
    pub fn formatted_value(&self, address: &CellAddress) -> String {
        debug_assert!(
            self.range.contains(address),
            "cell {} read outside loaded range {}",
            address,
            self.range
        );

        address
            .row
            .checked_sub(self.range.start.row)
            .zip(address.column.checked_sub(self.range.start.column))
            .and_then(|(row, column)| self.values.get(row as usize)?.get(column as usize))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{FailurePoint, InMemoryProvider, ProviderCall};

    fn credentials() -> ServiceAccountCredentials {
        ServiceAccountCredentials::new("reader@example.iam.gserviceaccount.com", "key")
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new("sheet-1").with_table(
            3,
            "accounts",
            vec![
                vec!["Account", "Goal"],
                vec!["Travel", "900"],
                vec![],
                vec!["Roth IRA", "6000"],
            ],
        )
    }

    async fn open<'a>(
        provider: &'a InMemoryProvider,
        selector: &TableSelector,
    ) -> PipelineResult<Worksheet<'a, InMemoryProvider>> {
        RemoteSpreadsheet::new(provider, "sheet-1")
            .authenticate(&credentials())
            .await?
            .load_metadata()
            .await?
            .select_table(selector)
    }

    #[tokio::test]
    async fn fetch_all_rows_skips_header_and_keeps_order() {
        let provider = provider();
        let sheet = open(&provider, &TableSelector::ById(3)).await.unwrap();

        let rows = sheet.fetch_all_rows().await.unwrap();

        assert_eq!(
            rows,
            vec![
                vec!["Travel".to_string(), "900".to_string()],
                vec![],
                vec!["Roth IRA".to_string(), "6000".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn unknown_selector_fails_table_selection() {
        let provider = provider();

        let err = open(&provider, &TableSelector::by_name("overview"))
            .await
            .err()
            .unwrap();

        assert_eq!(
            err.to_string(),
            "table selection error: no table named 'overview'"
        );
    }

    #[tokio::test]
    async fn metadata_failure_maps_to_metadata_error() {
        let provider = provider().failing_at(FailurePoint::SpreadsheetInfo, "quota exceeded");

        let err = open(&provider, &TableSelector::ById(3)).await.err().unwrap();

        assert_eq!(err.to_string(), "metadata load error: quota exceeded");
        assert_eq!(
            provider.calls(),
            vec![ProviderCall::Authenticate, ProviderCall::SpreadsheetInfo]
        );
    }

    #[tokio::test]
    async fn loaded_cells_read_formatted_values_and_blanks() {
        let provider = provider();
        let sheet = open(&provider, &TableSelector::ById(3)).await.unwrap();

        let cells = sheet
            .load_cell_range("A2:C2".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(cells.formatted_value(&"A2".parse().unwrap()), "Travel");
        assert_eq!(cells.formatted_value(&"B2".parse().unwrap()), "900");
        assert_eq!(cells.formatted_value(&"C2".parse().unwrap()), "");
    }

    #[tokio::test]
    async fn range_failure_reports_the_range() {
        let provider = provider().failing_at(FailurePoint::FormattedRange, "backend error");
        let sheet = open(&provider, &TableSelector::ById(3)).await.unwrap();

        let err = sheet
            .load_cell_range("A2:C2".parse().unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "range load error: A2:C2");
    }
}
