//! One handler per query. Every request builds and authenticates its own
//! spreadsheet handle; nothing is cached between requests.

use actix_web::{web, HttpResponse};

use super::respond::{respond, respond_with_placeholder, with_deadline};
use super::AppState;
use crate::sheets::TableProvider;

/// GET /getAllAccounts
pub async fn all_accounts<P: TableProvider>(state: web::Data<AppState<P>>) -> HttpResponse {
    let queries = state.queries();
    respond(with_deadline(state.request_timeout(), queries.all_account_rows()).await)
}

/// GET /getWorkingFund
///
/// Failures keep the `{name, amount, goal}` shape under `data`, with empty values.
pub async fn working_fund<P: TableProvider>(state: web::Data<AppState<P>>) -> HttpResponse {
    let queries = state.queries();
    respond_with_placeholder(with_deadline(state.request_timeout(), queries.working_fund()).await)
}

/// GET /getAccountNames
pub async fn account_names<P: TableProvider>(state: web::Data<AppState<P>>) -> HttpResponse {
    let queries = state.queries();
    respond(with_deadline(state.request_timeout(), queries.plan_account_names()).await)
}

/// GET /getPlanAccounts
pub async fn plan_accounts<P: TableProvider>(state: web::Data<AppState<P>>) -> HttpResponse {
    let queries = state.queries();
    respond(with_deadline(state.request_timeout(), queries.plan_accounts()).await)
}
