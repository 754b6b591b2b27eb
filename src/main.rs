use actix_cors::Cors;
use actix_web::{middleware::Logger, rt, web, App, HttpServer};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use taskboard::auth::TokenManager;
use taskboard::repository::{PgRepository, SharedRepository};
use taskboard::services::sweeper;
use taskboard::{routes, AppError, AppState, Config};

fn startup_error(err: AppError) -> io::Error {
    error!("startup failed: {}", err);
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error(e.into()))?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error(e.into()))?;

    let repo: SharedRepository = Arc::new(PgRepository::new(pool));
    let tokens = Arc::new(TokenManager::new(&config.jwt));
    let state = web::Data::new(AppState::new(repo, tokens));

    rt::spawn(sweeper::run(
        state.identity.clone(),
        config.token_sweep_interval,
    ));

    info!("starting server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .configure(routes::app)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
