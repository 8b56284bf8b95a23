use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};

use vote_ledger::api::{self, AppState};
use vote_ledger::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        error!("startup aborted: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;
    let state = AppState::new(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let state = web::Data::new(state);

    info!(
        "⛓️ Starting vote ledger API at http://{}:{} (difficulty={}, mining timeout={:?})",
        config.host, config.port, config.difficulty, config.mining_timeout
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
