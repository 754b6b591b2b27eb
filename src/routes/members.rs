use crate::{
    auth::AuthenticatedMember,
    error::AppError,
    models::{JoinBoardInput, ProfileUpdate},
    services::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

#[get("/me")]
pub async fn get_me(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
) -> Result<impl Responder, AppError> {
    let member = state.identity.get_profile(auth.id()).await?;
    Ok(HttpResponse::Ok().json(member))
}

/// Update the caller's profile
///
/// Only the fields present in the body change. `full_name: null` clears the name.
#[put("/me")]
pub async fn update_me(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    body: web::Json<ProfileUpdate>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let member = state
        .identity
        .update_profile(auth.id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(member))
}

/// Join a board by its slug
///
/// ## Responses:
/// - `200 OK`: the joined board.
/// - `403 Forbidden`: wrong board password.
/// - `404 Not Found`: no board with this slug.
/// - `409 Conflict`: already a member.
#[post("/boards/{slug}/join")]
pub async fn join_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    slug: web::Path<String>,
    body: web::Json<JoinBoardInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let board = state
        .membership
        .join(&slug, &body.password, auth.id())
        .await?;
    Ok(HttpResponse::Ok().json(board))
}

#[post("/boards/{board_id}/star")]
pub async fn star_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    board_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.membership.star(*board_id, auth.id()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/boards/{board_id}/star")]
pub async fn unstar_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    board_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.membership.unstar(*board_id, auth.id()).await?;
    Ok(HttpResponse::NoContent().finish())
}
