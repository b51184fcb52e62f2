//! Route registration.

use actix_web::{web, HttpResponse};
use serde_json::json;

use super::handlers;
use crate::sheets::TableProvider;

/// Registers the account endpoints for provider `P`:
/// - GET /getAllAccounts - raw rows of the accounts table
/// - GET /getWorkingFund - `{name, amount, goal}` of the working fund
/// - GET /getAccountNames - names of the plan accounts
/// - GET /getPlanAccounts - raw rows of the plan overview
/// - GET /healthcheck
pub fn configure<P: TableProvider>(cfg: &mut web::ServiceConfig) {
    cfg.route("/getAllAccounts", web::get().to(handlers::all_accounts::<P>))
        .route("/getWorkingFund", web::get().to(handlers::working_fund::<P>))
        .route("/getAccountNames", web::get().to(handlers::account_names::<P>))
        .route("/getPlanAccounts", web::get().to(handlers::plan_accounts::<P>))
        .route("/healthcheck", web::get().to(healthcheck_handler));
}

async fn healthcheck_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
