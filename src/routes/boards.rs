use crate::{
    auth::AuthenticatedMember,
    error::AppError,
    models::{BoardListQuery, BoardUpdate, NewBoard},
    services::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Lists the boards the authenticated member belongs to.
///
/// ## Query Parameters:
/// - `starred` (optional): only starred boards when `true`.
/// - `limit` (optional): page size, 1 to 100, default 20.
/// - `offset` (optional): rows to skip, default 0.
///
/// ## Responses:
/// - `200 OK`: a `BoardPage` with the boards and the total count.
/// - `401 Unauthorized`: missing or invalid access token.
#[get("")]
pub async fn get_boards(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    query: web::Query<BoardListQuery>,
) -> Result<impl Responder, AppError> {
    let page = state
        .boards
        .list_for_member(auth.id(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Creates a board owned by the authenticated member.
///
/// ## Responses:
/// - `201 Created`: the new board.
/// - `409 Conflict`: the slug is taken.
/// - `422 Unprocessable Entity`: invalid name, slug or password.
#[post("")]
pub async fn create_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    board_data: web::Json<NewBoard>,
) -> Result<impl Responder, AppError> {
    board_data.validate()?;
    let board = state
        .boards
        .create(auth.id(), board_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(board))
}

/// Board with its lists, members and the caller's role and star flag.
#[get("/{board_id}")]
pub async fn get_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    board_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let details = state.boards.get_details(*board_id, auth.id()).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// Owner only.
#[put("/{board_id}")]
pub async fn update_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    board_id: web::Path<Uuid>,
    board_data: web::Json<BoardUpdate>,
) -> Result<impl Responder, AppError> {
    board_data.validate()?;
    let board = state
        .boards
        .update(*board_id, auth.id(), board_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(board))
}

/// Owner only. Lists and cards go with the board.
#[delete("/{board_id}")]
pub async fn delete_board(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    board_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.boards.delete(*board_id, auth.id()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Removes a member from a board, or lets the caller leave it.
///
/// ## Responses:
/// - `204 No Content`: removed.
/// - `403 Forbidden`: caller is not a member, not the owner, or is the owner leaving.
/// - `404 Not Found`: unknown board or the target is not a member.
#[delete("/{board_id}/members/{member_id}")]
pub async fn remove_member(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, AppError> {
    let (board_id, member_id) = path.into_inner();
    state
        .membership
        .remove_member(board_id, member_id, auth.id())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
