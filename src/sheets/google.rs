// src/sheets/google.rs
use async_trait::async_trait;
use google_sheets4::api::{Sheet, Spreadsheet, ValueRange};
use google_sheets4::{hyper, hyper_rustls, Sheets};
use log::debug;
use serde_json::{json, Value};
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use super::{ServiceAccountCredentials, TableProvider};
use crate::data_types::{CellRange, RawRow, SpreadsheetInfo, TableInfo};

const SPREADSHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const FORMATTED_VALUE: &str = "FORMATTED_VALUE";

pub type SheetsHub = Sheets<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>;

#[derive(Debug, thiserror::Error)]
pub enum GoogleSheetsError {
    #[error("invalid service account key: {0}")]
    Key(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Token(#[from] yup_oauth2::Error),

    #[error("{0}")]
    Api(#[from] google_sheets4::Error),
}

/// Reads spreadsheets through the Google Sheets v4 API with a service account.
#[derive(Debug, Clone, Default)]
pub struct GoogleSheetsProvider {}

impl GoogleSheetsProvider {
    pub fn new() -> Self {
        GoogleSheetsProvider {}
    }

    fn service_account_key(
        credentials: &ServiceAccountCredentials,
    ) -> Result<ServiceAccountKey, GoogleSheetsError> {
        let key = serde_json::from_value(json!({
            "type": "service_account",
            "client_email": credentials.client_email,
            "private_key": credentials.private_key,
            "token_uri": credentials.token_uri,
        }))?;
        Ok(key)
    }
}

#[async_trait(?Send)]
impl TableProvider for GoogleSheetsProvider {
    type Session = SheetsHub;
    type Error = GoogleSheetsError;

    async fn authenticate(
        &self,
        credentials: &ServiceAccountCredentials,
    ) -> Result<SheetsHub, GoogleSheetsError> {
        let key = Self::service_account_key(credentials)?;
        let auth = ServiceAccountAuthenticator::builder(key).build().await?;

        // Fetch a token now so bad credentials fail here and not on the first read.
        auth.token(&[SPREADSHEETS_READONLY_SCOPE]).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Sheets::new(hyper::Client::builder().build(connector), auth))
    }

    async fn spreadsheet_info(
        &self,
        session: &SheetsHub,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, GoogleSheetsError> {
        let (_, spreadsheet) = session.spreadsheets().get(spreadsheet_id).doit().await?;
        Ok(spreadsheet_info(spreadsheet))
    }

    async fn table_values(
        &self,
        session: &SheetsHub,
        spreadsheet_id: &str,
        table: &TableInfo,
    ) -> Result<Vec<RawRow>, GoogleSheetsError> {
        let range = table.a1_prefix();
        debug!("Reading values {} from {}", range, spreadsheet_id);

        let (_, response) = session
            .spreadsheets()
            .values_get(spreadsheet_id, &range)
            .value_render_option(FORMATTED_VALUE)
            .doit()
            .await?;
        Ok(rows(response))
    }

    async fn formatted_range(
        &self,
        session: &SheetsHub,
        spreadsheet_id: &str,
        table: &TableInfo,
        range: &CellRange,
    ) -> Result<Vec<RawRow>, GoogleSheetsError> {
        let range = format!("{}!{}", table.a1_prefix(), range);
        debug!("Reading cells {} from {}", range, spreadsheet_id);

        let (_, response) = session
            .spreadsheets()
            .values_get(spreadsheet_id, &range)
            .value_render_option(FORMATTED_VALUE)
            .doit()
            .await?;
        Ok(rows(response))
    }
}

/// Accepts either a bare spreadsheet id or a URL like
/// `https://docs.google.com/spreadsheets/d/<id>/edit`.
pub fn spreadsheet_id(input: &str) -> &str {
    let parts: Vec<&str> = input.split('/').collect();
    parts
        .windows(2)
        .find(|pair| pair[0] == "d" && !pair[1].is_empty())
        .map(|pair| pair[1])
        .unwrap_or(input)
}

fn spreadsheet_info(spreadsheet: Spreadsheet) -> SpreadsheetInfo {
    SpreadsheetInfo {
        title: spreadsheet
            .properties
            .and_then(|properties| properties.title)
            .unwrap_or_default(),
        tables: spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(table_info)
            .collect(),
    }
}

fn table_info(sheet: Sheet) -> Option<TableInfo> {
    let properties = sheet.properties?;
    let grid = properties.grid_properties;

    Some(TableInfo {
        sheet_id: properties.sheet_id?,
        title: properties.title.unwrap_or_default(),
        row_count: grid.as_ref().and_then(|g| g.row_count),
        column_count: grid.as_ref().and_then(|g| g.column_count),
    })
}

fn rows(response: ValueRange) -> Vec<RawRow> {
    response
        .values
        .unwrap_or_default()
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect()
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_sheets4::api::{GridProperties, SheetProperties, SpreadsheetProperties};

    fn sheet(id: Option<i32>, title: &str, rows: i32) -> Sheet {
        Sheet {
            properties: Some(SheetProperties {
                sheet_id: id,
                title: Some(title.to_string()),
                grid_properties: Some(GridProperties {
                    row_count: Some(rows),
                    column_count: Some(4),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn maps_spreadsheet_metadata() {
        let spreadsheet = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some("Blanket".to_string()),
                ..Default::default()
            }),
            sheets: Some(vec![
                sheet(Some(0), "overview", 20),
                sheet(None, "broken", 1),
                sheet(Some(1873), "accounts", 12),
            ]),
            ..Default::default()
        };

        let info = spreadsheet_info(spreadsheet);

        assert_eq!(info.title, "Blanket");
        assert_eq!(info.tables.len(), 2);
        assert_eq!(info.tables[1].sheet_id, 1873);
        assert_eq!(info.tables[1].title, "accounts");
        assert_eq!(info.tables[1].row_count, Some(12));
        assert_eq!(info.tables[1].column_count, Some(4));
    }

    #[test]
    fn converts_cells_to_text() {
        let response = ValueRange {
            values: Some(vec![
                vec![json!("Travel"), json!(900), json!(true)],
                vec![],
                vec![Value::Null, json!(" padded ")],
            ]),
            ..Default::default()
        };

        assert_eq!(
            rows(response),
            vec![
                vec!["Travel".to_string(), "900".to_string(), "true".to_string()],
                vec![],
                vec![String::new(), " padded ".to_string()],
            ]
        );
    }

    #[test]
    fn extracts_spreadsheet_id_from_url() {
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/1AbC-xyz/edit#gid=0"),
            "1AbC-xyz"
        );
        assert_eq!(spreadsheet_id("1AbC-xyz"), "1AbC-xyz");
    }

    #[test]
    fn builds_service_account_key_from_credentials() {
        let credentials =
            ServiceAccountCredentials::new("reader@example.iam.gserviceaccount.com", "-----KEY-----");

        let key = GoogleSheetsProvider::service_account_key(&credentials).unwrap();

        assert_eq!(key.client_email, "reader@example.iam.gserviceaccount.com");
        assert_eq!(key.private_key, "-----KEY-----");
        assert_eq!(key.token_uri, crate::sheets::DEFAULT_TOKEN_URI);
    }
}
