use std::net::SocketAddr;
use std::sync::Arc;

use astra::{ConnectionInfo, Request, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::alerts::MailNotifier;
use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::mailer::Mailer;
use crate::responses::error_to_response;
use crate::router::{handle, is_htmx, AppState, ClientAddr};

mod alerts;
mod auth;
mod config;
mod consensus;
mod db;
mod domain;
mod errors;
mod import;
mod mailer;
mod responses;
mod router;
mod templates;

#[cfg(test)]
mod tests;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "configuration rejected");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.database_path.clone());
    if let Err(e) = init_db(&db) {
        error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(bind_addr = %config.bind_addr, error = %e, "invalid BIND_ADDR");
            std::process::exit(1);
        }
    };

    let mailer: Arc<dyn Mailer> = Arc::from(mailer::from_config(&config));
    let notifier = Arc::new(MailNotifier::new(mailer.clone(), config.public_base_url.clone()));
    let max_workers = config.max_workers;

    let state = AppState {
        db,
        config,
        mailer,
        notifier,
    };

    info!(%addr, max_workers, threshold = state.config.approval_threshold, "starting server");

    let server = Server::bind(&addr).max_workers(max_workers);

    let result = server.serve(move |mut req: Request, conn_info: ConnectionInfo| {
        if let Some(peer) = conn_info.peer_addr() {
            req.extensions_mut().insert(ClientAddr(peer));
        }
        let htmx = is_htmx(&req);
        match handle(req, &state) {
            Ok(resp) => resp,
            Err(err) => error_to_response(err, htmx),
        }
    });

    if let Err(e) = result {
        error!(error = %e, "server ended with error");
    }

    info!("server shut down");
}
