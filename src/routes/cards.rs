use crate::{
    auth::AuthenticatedMember,
    error::AppError,
    models::{CardUpdate, NewCard},
    services::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Creates a card in a list.
///
/// ## Request Body:
/// - `list_id`: the list to add the card to (required).
/// - `title`: 1 to 200 characters (required).
/// - `description` (optional).
/// - `position` (optional): explicit ordering key. Omit to append.
///
/// ## Responses:
/// - `201 Created`: the new card.
/// - `403 Forbidden`: the caller is not a member of the list's board.
/// - `404 Not Found`: the list does not exist.
#[post("")]
pub async fn create_card(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    card_data: web::Json<NewCard>,
) -> Result<impl Responder, AppError> {
    card_data.validate()?;
    let card = state
        .cards
        .create(auth.id(), card_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(card))
}

#[get("/{card_id}")]
pub async fn get_card(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    card_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let card = state.cards.get(*card_id, auth.id()).await?;
    Ok(HttpResponse::Ok().json(card))
}

/// Updates a card. Setting `list_id` moves it to another list on the same board.
///
/// ## Responses:
/// - `200 OK`: the updated card.
/// - `404 Not Found`: the card or the destination list does not exist.
/// - `422 Unprocessable Entity`: invalid fields, or the destination list is on another board.
#[put("/{card_id}")]
pub async fn update_card(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    card_id: web::Path<Uuid>,
    card_data: web::Json<CardUpdate>,
) -> Result<impl Responder, AppError> {
    card_data.validate()?;
    let card = state
        .cards
        .update(*card_id, auth.id(), card_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(card))
}

#[delete("/{card_id}")]
pub async fn delete_card(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    card_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.cards.delete(*card_id, auth.id()).await?;
    Ok(HttpResponse::NoContent().finish())
}
