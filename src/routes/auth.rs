use crate::{
    auth::{AuthenticatedMember, LoginRequest, RefreshRequest, RegisterRequest},
    error::AppError,
    models::NewMember,
    services::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new member
///
/// Creates the account only; the client logs in afterwards.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let data = register_data.into_inner();

    let member = state
        .identity
        .register(NewMember {
            email: data.email,
            username: data.username,
            full_name: data.full_name,
            password: data.password,
        })
        .await?;

    Ok(HttpResponse::Created().json(member))
}

/// Login member
///
/// Returns an access token, a refresh token and the member profile.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let response = state
        .identity
        .login(&login_data.email, &login_data.password)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Exchange a refresh token for a new access token.
#[post("/refresh")]
pub async fn refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let response = state.identity.refresh(&body.refresh_token).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Revoke a single refresh token.
#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    state.identity.logout(&body.refresh_token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Revoke every refresh token of the authenticated member.
#[post("/logout-all")]
pub async fn logout_all(
    state: web::Data<AppState>,
    auth: AuthenticatedMember,
) -> Result<impl Responder, AppError> {
    let revoked = state.identity.revoke_all_sessions(auth.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "revoked": revoked })))
}
