pub mod auth;
pub mod boards;
pub mod cards;
pub mod health;
pub mod lists;
pub mod members;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every route. `/health` is public; everything under `/api` passes through
/// `AuthMiddleware`, which lets the unauthenticated identity endpoints through.
pub fn app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::health)
        .service(web::scope("/api").wrap(AuthMiddleware).configure(config));
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(auth::logout)
            .service(auth::logout_all),
    )
    .service(
        web::scope("/members")
            .service(members::get_me)
            .service(members::update_me)
            .service(members::join_board)
            .service(members::star_board)
            .service(members::unstar_board),
    )
    .service(
        web::scope("/boards")
            .service(boards::get_boards)
            .service(boards::create_board)
            .service(boards::get_board)
            .service(boards::update_board)
            .service(boards::delete_board)
            .service(boards::remove_member),
    )
    .service(
        web::scope("/lists")
            .service(lists::create_list)
            .service(lists::get_list)
            .service(lists::update_list)
            .service(lists::delete_list),
    )
    .service(
        web::scope("/cards")
            .service(cards::create_card)
            .service(cards::get_card)
            .service(cards::update_card)
            .service(cards::delete_card),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
