//! HTTP surface.
//!
//! Each endpoint runs one query from [`pipelines`](crate::pipelines) against
//! a fresh spreadsheet handle and folds the outcome with [`respond`].

use actix_cors::Cors;
use std::time::Duration;

use crate::pipelines::{AccountQueries, SpreadsheetSource};
use crate::sheets::TableProvider;

pub mod handlers;
pub mod respond;
pub mod routes;

pub use routes::configure;

/// Shared, read-only state handed to every handler.
pub struct AppState<P: TableProvider> {
    provider: P,
    source: SpreadsheetSource,
    request_timeout: Duration,
}

impl<P: TableProvider> AppState<P> {
    pub fn new(provider: P, source: SpreadsheetSource, request_timeout: Duration) -> Self {
        AppState {
            provider,
            source,
            request_timeout,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn queries(&self) -> AccountQueries<'_, P> {
        AccountQueries::new(&self.provider, &self.source)
    }
}

/// Cross-origin policy for browser clients: any origin, method and header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}
