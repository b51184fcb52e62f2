//! Fixture-backed provider with failure injection and a call log.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::{ServiceAccountCredentials, TableProvider};
use crate::data_types::{CellRange, RawRow, SpreadsheetInfo, TableInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Authenticate,
    SpreadsheetInfo,
    TableValues(String),
    FormattedRange(String, String),
}

/// Provider step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Authenticate,
    SpreadsheetInfo,
    TableValues,
    FormattedRange,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MemoryProviderError(pub String);

#[derive(Debug)]
struct MemoryTable {
    info: TableInfo,
    grid: Vec<RawRow>,
}

#[derive(Debug)]
pub struct InMemoryProvider {
    spreadsheet_id: String,
    title: String,
    tables: Vec<MemoryTable>,
    failure: Option<(FailurePoint, String)>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl InMemoryProvider {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        InMemoryProvider {
            spreadsheet_id: spreadsheet_id.into(),
            title: "Blanket".to_string(),
            tables: Vec::new(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Adds a table; the first row of `grid` is its header row.
    pub fn with_table<G, R, S>(mut self, sheet_id: i32, title: &str, grid: G) -> Self
    where
        G: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grid: Vec<RawRow> = grid
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let mut info = TableInfo::new(sheet_id, title);
        info.row_count = Some(grid.len() as i32);
        info.column_count = Some(grid.iter().map(Vec::len).max().unwrap_or(0) as i32);

        self.tables.push(MemoryTable { info, grid });
        self
    }

    pub fn failing_at(mut self, point: FailurePoint, message: impl Into<String>) -> Self {
        self.failure = Some((point, message.into()));
        self
    }

    /// Calls observed so far, in order, including the one that failed.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: ProviderCall, point: FailurePoint) -> Result<(), MemoryProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        match &self.failure {
            Some((failing, message)) if *failing == point => {
                Err(MemoryProviderError(message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn grid(&self, table: &TableInfo) -> Result<&[RawRow], MemoryProviderError> {
        self.tables
            .iter()
            .find(|t| t.info.sheet_id == table.sheet_id)
            .map(|t| t.grid.as_slice())
            .ok_or_else(|| MemoryProviderError(format!("no sheet with id {}", table.sheet_id)))
    }

    fn check_spreadsheet(&self, spreadsheet_id: &str) -> Result<(), MemoryProviderError> {
        if spreadsheet_id == self.spreadsheet_id {
            Ok(())
        } else {
            Err(MemoryProviderError(format!(
                "spreadsheet {} not found",
                spreadsheet_id
            )))
        }
    }
}

#[async_trait(?Send)]
impl TableProvider for InMemoryProvider {
    type Session = ();
    type Error = MemoryProviderError;

    async fn authenticate(
        &self,
        _credentials: &ServiceAccountCredentials,
    ) -> Result<(), MemoryProviderError> {
        self.record(ProviderCall::Authenticate, FailurePoint::Authenticate)
    }

    async fn spreadsheet_info(
        &self,
        _session: &(),
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, MemoryProviderError> {
        self.record(ProviderCall::SpreadsheetInfo, FailurePoint::SpreadsheetInfo)?;
        self.check_spreadsheet(spreadsheet_id)?;

        Ok(SpreadsheetInfo {
            title: self.title.clone(),
            tables: self.tables.iter().map(|t| t.info.clone()).collect(),
        })
    }

    async fn table_values(
        &self,
        _session: &(),
        spreadsheet_id: &str,
        table: &TableInfo,
    ) -> Result<Vec<RawRow>, MemoryProviderError> {
        self.record(
            ProviderCall::TableValues(table.title.clone()),
            FailurePoint::TableValues,
        )?;
        self.check_spreadsheet(spreadsheet_id)?;

        Ok(self.grid(table)?.to_vec())
    }

    async fn formatted_range(
        &self,
        _session: &(),
        spreadsheet_id: &str,
        table: &TableInfo,
        range: &CellRange,
    ) -> Result<Vec<RawRow>, MemoryProviderError> {
        self.record(
            ProviderCall::FormattedRange(table.title.clone(), range.to_string()),
            FailurePoint::FormattedRange,
        )?;
        self.check_spreadsheet(spreadsheet_id)?;

        let first_row = (range.start.row - 1) as usize;
        let last_row = (range.end.row - 1) as usize;
        let first_column = range.start.column as usize;
        let last_column = range.end.column as usize;

        Ok(self
            .grid(table)?
            .iter()
            .enumerate()
            .filter(|(index, _)| (first_row..=last_row).contains(index))
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(index, _)| (first_column..=last_column).contains(index))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect())
    }
}
