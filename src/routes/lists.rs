use crate::{
    auth::AuthenticatedMember,
    error::AppError,
    models::{ListUpdate, NewList},
    services::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Creates a list on a board the caller belongs to. Without `position` the list is
/// appended after the last one.
#[post("")]
pub async fn create_list(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    list_data: web::Json<NewList>,
) -> Result<impl Responder, AppError> {
    list_data.validate()?;
    let list = state
        .lists
        .create(auth.id(), list_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(list))
}

#[get("/{list_id}")]
pub async fn get_list(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    list_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let list = state.lists.get_with_cards(*list_id, auth.id()).await?;
    Ok(HttpResponse::Ok().json(list))
}

#[put("/{list_id}")]
pub async fn update_list(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    list_id: web::Path<Uuid>,
    list_data: web::Json<ListUpdate>,
) -> Result<impl Responder, AppError> {
    list_data.validate()?;
    let list = state
        .lists
        .update(*list_id, auth.id(), list_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[delete("/{list_id}")]
pub async fn delete_list(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
    list_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.lists.delete(*list_id, auth.id()).await?;
    Ok(HttpResponse::NoContent().finish())
}
