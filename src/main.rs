// Blanket server
//
// Serves account data read from Google Sheets to the browser client.

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use blanket::config::AppConfig;
use blanket::http::{self, AppState};
use blanket::logging;
use blanket::sheets::GoogleSheetsProvider;
use log::info;
use std::time::Duration;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    info!("Starting Blanket v{}", env!("CARGO_PKG_VERSION"));

    let source = config.source()?;
    info!(
        "Reading spreadsheet {} (accounts {}, working fund {}, plan {})",
        source.spreadsheet_id, source.accounts_table, source.working_fund_table, source.plan_table
    );

    let state = web::Data::new(AppState::new(
        GoogleSheetsProvider::new(),
        source,
        Duration::from_secs(config.server.request_timeout_secs),
    ));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    info!("Endpoints: GET /getAllAccounts, /getWorkingFund, /getAccountNames, /getPlanAccounts");

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(http::cors())
            .app_data(state.clone())
            .configure(http::configure::<GoogleSheetsProvider>)
    })
    .bind(&bind_addr)?;
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}
