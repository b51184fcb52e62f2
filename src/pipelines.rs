//! The queries served over HTTP.
//!
//! Every query walks the same chain: new handle, authenticate, load
//! metadata, select a table, then read. `?` stops the chain at the first
//! failing step and hands that step's error back unchanged.

use log::{debug, warn};

use crate::data_types::{CellAddress, CellRange, RawRow, TableSelector, WorkingFund};
use crate::decode::{decode, AccountName, AccountRow};
use crate::error::PipelineResult;
use crate::sheets::{RemoteSpreadsheet, ServiceAccountCredentials, TableProvider, Worksheet};

/// Cells holding the working fund's name, current amount and goal.
const WORKING_FUND_NAME: CellAddress = CellAddress { column: 0, row: 2 };
const WORKING_FUND_AMOUNT: CellAddress = CellAddress { column: 1, row: 2 };
const WORKING_FUND_GOAL: CellAddress = CellAddress { column: 2, row: 2 };

/// Spreadsheet, credentials and table selectors the queries run against.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    pub spreadsheet_id: String,
    pub credentials: ServiceAccountCredentials,
    pub accounts_table: TableSelector,
    pub working_fund_table: TableSelector,
    pub plan_table: TableSelector,
}

pub struct AccountQueries<'a, P: TableProvider> {
    provider: &'a P,
    source: &'a SpreadsheetSource,
}

impl<'a, P: TableProvider> AccountQueries<'a, P> {
    pub fn new(provider: &'a P, source: &'a SpreadsheetSource) -> Self {
        AccountQueries { provider, source }
    }

    async fn open_table(&self, selector: &TableSelector) -> PipelineResult<Worksheet<'a, P>> {
        RemoteSpreadsheet::new(self.provider, self.source.spreadsheet_id.as_str())
            .authenticate(&self.source.credentials)
            .await?
            .load_metadata()
            .await?
            .select_table(selector)
    }

    /// Every data row of the accounts table, unmodified.
    pub async fn all_account_rows(&self) -> PipelineResult<Vec<RawRow>> {
        self.open_table(&self.source.accounts_table)
            .await?
            .fetch_all_rows()
            .await
    }

    pub async fn working_fund(&self) -> PipelineResult<WorkingFund> {
        let cells = self
            .open_table(&self.source.working_fund_table)
            .await?
            .load_cell_range(CellRange::new(WORKING_FUND_NAME, WORKING_FUND_GOAL))
            .await?;

        Ok(WorkingFund {
            name: cells.formatted_value(&WORKING_FUND_NAME),
            amount: cells.formatted_value(&WORKING_FUND_AMOUNT),
            goal: cells.formatted_value(&WORKING_FUND_GOAL),
        })
    }

    /// Names of the plan accounts. Rows that do not decode as accounts are
    /// left out of the result.
    pub async fn plan_account_names(&self) -> PipelineResult<Vec<AccountName>> {
        let rows = self
            .open_table(&self.source.plan_table)
            .await?
            .fetch_all_rows()
            .await?;

        let decoded = decode::<AccountRow>(&rows);
        if !decoded.failures.is_empty() {
            warn!(
                "Skipped {} of {} plan rows that are not accounts",
                decoded.failures.len(),
                rows.len()
            );
            for failure in &decoded.failures {
                debug!("Skipped plan {}", failure);
            }
        }

        Ok(decoded.decoded.into_iter().map(|row| row.name).collect())
    }

    pub async fn plan_accounts(&self) -> PipelineResult<Vec<RawRow>> {
        self.open_table(&self.source.plan_table)
            .await?
            .fetch_all_rows()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::sheets::{FailurePoint, InMemoryProvider, ProviderCall};
    use pretty_assertions::assert_eq;

    const ACCOUNTS_SHEET: i32 = 1873;

    fn source() -> SpreadsheetSource {
        SpreadsheetSource {
            spreadsheet_id: "blanket-sheet".to_string(),
            credentials: ServiceAccountCredentials::new("svc@example.com", "key"),
            accounts_table: TableSelector::ById(ACCOUNTS_SHEET),
            working_fund_table: TableSelector::ById(ACCOUNTS_SHEET),
            plan_table: TableSelector::by_name("overview"),
        }
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new("blanket-sheet")
            .with_table(
                ACCOUNTS_SHEET,
                "accounts",
                vec![
                    vec!["Account", "Balance", "Goal"],
                    vec!["Emergency Fund", "1200.00", "5000.00"],
                    vec!["Travel", "300.00", "900.00"],
                ],
            )
            .with_table(
                0,
                "overview",
                vec![
                    vec!["Account", "Goal", "Completion Amount", "Completion Date"],
                    vec!["Working Capital", "100", "50", "2021-01-01"],
                    vec!["NotARealAccount", "1", "1", "2021-01-01"],
                    vec![" Roth IRA ", "6000", "0", "2030-01-01"],
                ],
            )
    }

    fn strings(rows: &[&[&str]]) -> Vec<RawRow> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn all_account_rows_returns_table_rows_in_order() {
        let provider = provider();
        let source = source();

        let rows = AccountQueries::new(&provider, &source)
            .all_account_rows()
            .await
            .unwrap();

        assert_eq!(
            rows,
            strings(&[
                &["Emergency Fund", "1200.00", "5000.00"],
                &["Travel", "300.00", "900.00"],
            ])
        );
    }

    #[tokio::test]
    async fn working_fund_reads_the_first_data_row() {
        let provider = provider();
        let source = source();

        let fund = AccountQueries::new(&provider, &source)
            .working_fund()
            .await
            .unwrap();

        assert_eq!(
            fund,
            WorkingFund {
                name: "Emergency Fund".to_string(),
                amount: "1200.00".to_string(),
                goal: "5000.00".to_string(),
            }
        );
        assert_eq!(
            provider.calls().last(),
            Some(&ProviderCall::FormattedRange(
                "accounts".to_string(),
                "A2:C2".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn plan_account_names_skips_rows_that_are_not_accounts() {
        let provider = provider();
        let source = source();

        let names = AccountQueries::new(&provider, &source)
            .plan_account_names()
            .await
            .unwrap();

        // "NotARealAccount" is dropped without failing the request.
        assert_eq!(names, vec![AccountName::WorkingCapital, AccountName::RothIra]);
    }

    #[tokio::test]
    async fn plan_accounts_returns_raw_rows_untrimmed() {
        let provider = provider();
        let source = source();

        let rows = AccountQueries::new(&provider, &source)
            .plan_accounts()
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], " Roth IRA ");
    }

    #[tokio::test]
    async fn auth_failure_stops_before_any_other_call() {
        let provider = provider().failing_at(FailurePoint::Authenticate, "invalid_grant");
        let source = source();

        let err = AccountQueries::new(&provider, &source)
            .all_account_rows()
            .await
            .unwrap_err();

        assert_eq!(err, PipelineError::Authentication("invalid_grant".to_string()));
        assert_eq!(err.to_string(), "auth error: invalid_grant");
        assert_eq!(provider.calls(), vec![ProviderCall::Authenticate]);
    }

    #[tokio::test]
    async fn row_failure_is_returned_unchanged() {
        let provider = provider().failing_at(FailurePoint::TableValues, "rate limited");
        let source = source();

        let err = AccountQueries::new(&provider, &source)
            .plan_account_names()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "row load error: rate limited");
    }

    #[tokio::test]
    async fn unknown_plan_sheet_fails_selection_without_fetching() {
        let provider = provider();
        let mut source = source();
        source.plan_table = TableSelector::by_name("stages");

        let err = AccountQueries::new(&provider, &source)
            .plan_accounts()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "table selection error: no table named 'stages'");
        assert_eq!(
            provider.calls(),
            vec![ProviderCall::Authenticate, ProviderCall::SpreadsheetInfo]
        );
    }
}
