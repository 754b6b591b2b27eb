//! Registration, login, token refresh/revocation and profile management.

use chrono::{Duration, Utc};
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_decoy, verify_password};
use crate::auth::token::{hash_token, TokenManager};
use crate::auth::{AuthenticatedMember, AuthResponse, RefreshResponse, MIN_PASSWORD_LEN};
use crate::error::AppError;
use crate::models::{Member, NewMember, ProfileUpdate, RefreshToken};
use crate::repository::SharedRepository;

/// Revoked refresh tokens are kept this long before the sweep deletes them.
pub const REVOKED_TOKEN_RETENTION_DAYS: i64 = 30;

#[derive(Clone)]
pub struct IdentityService {
    repo: SharedRepository,
    tokens: Arc<TokenManager>,
}

impl IdentityService {
    pub fn new(repo: SharedRepository, tokens: Arc<TokenManager>) -> Self {
        Self { repo, tokens }
    }

    pub async fn register(&self, input: NewMember) -> Result<Member, AppError> {
        check_password(&input.password)?;

        if self.repo.find_member_by_email(&input.email).await?.is_some()
            || self
                .repo
                .find_member_by_username(&input.username)
                .await?
                .is_some()
        {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = hash_password(&input.password)?;
        let member = Member::new(input, password_hash);
        self.repo.insert_member(&member).await?;

        info!("registered member {} ({})", member.id, member.username);
        Ok(member)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let member = match self.repo.find_member_by_email(email).await? {
            Some(member) => member,
            None => {
                verify_decoy(password);
                warn!("login failed: unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !verify_password(password, &member.password_hash)? {
            warn!("login failed: bad password for member {}", member.id);
            return Err(AppError::InvalidCredentials);
        }

        let (access_token, expires_in) = self.tokens.issue_access(&member)?;
        let refresh = self.tokens.issue_refresh(member.id)?;
        self.repo
            .insert_refresh_token(&RefreshToken::new(
                member.id,
                refresh.token_hash,
                refresh.expires_at,
            ))
            .await?;

        info!("member {} logged in", member.id);
        Ok(AuthResponse {
            access_token,
            refresh_token: refresh.token,
            expires_in,
            member,
        })
    }

    /// Exchanges a live refresh token for a new access token. The refresh token itself
    /// is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AppError> {
        let member_id = self
            .tokens
            .validate_refresh(refresh_token)
            .map_err(|_| AppError::InvalidRefreshToken)?;

        let stored = self
            .repo
            .find_active_refresh_token(&hash_token(refresh_token), Utc::now())
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;
        if stored.member_id != member_id {
            return Err(AppError::InvalidRefreshToken);
        }

        let member = self
            .repo
            .find_member_by_id(member_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let (access_token, expires_in) = self.tokens.issue_access(&member)?;
        Ok(RefreshResponse {
            access_token,
            expires_in,
            member,
        })
    }

    /// Revokes one refresh token.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let member_id = self
            .tokens
            .validate_refresh(refresh_token)
            .map_err(|_| AppError::InvalidRefreshToken)?;

        if !self
            .repo
            .revoke_refresh_token(&hash_token(refresh_token))
            .await?
        {
            return Err(AppError::InvalidRefreshToken);
        }
        info!("revoked refresh token for member {}", member_id);
        Ok(())
    }

    /// Revokes every outstanding refresh token of the member.
    pub async fn revoke_all_sessions(&self, member_id: Uuid) -> Result<u64, AppError> {
        let count = self.repo.revoke_member_tokens(member_id).await?;
        info!("revoked {} refresh tokens for member {}", count, member_id);
        Ok(count)
    }

    /// Validates an access token and loads its member fresh from storage.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthenticatedMember, AppError> {
        let claims = self.tokens.validate_access(access_token)?;
        match self.repo.find_member_by_id(claims.sub).await? {
            Some(member) => Ok(AuthenticatedMember::new(member)),
            None => {
                warn!("access token presented for missing member {}", claims.sub);
                Err(AppError::InvalidToken)
            }
        }
    }

    pub async fn get_profile(&self, member_id: Uuid) -> Result<Member, AppError> {
        self.repo
            .find_member_by_id(member_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        member_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Member, AppError> {
        let mut member = self.get_profile(member_id).await?;
        if update.is_empty() {
            return Ok(member);
        }

        if let Some(email) = update.email {
            if email != member.email {
                if let Some(other) = self.repo.find_member_by_email(&email).await? {
                    if other.id != member_id {
                        return Err(AppError::EmailAlreadyTaken);
                    }
                }
                member.email = email;
            }
        }

        if let Some(username) = update.username {
            if username != member.username {
                if let Some(other) = self.repo.find_member_by_username(&username).await? {
                    if other.id != member_id {
                        return Err(AppError::UsernameAlreadyTaken);
                    }
                }
                member.username = username;
            }
        }

        if let Some(full_name) = update.full_name {
            member.full_name = full_name;
        }

        if let Some(password) = update.password {
            check_password(&password)?;
            member.password_hash = hash_password(&password)?;
        }

        member.updated_at = Utc::now();
        if !self.repo.update_member(&member).await? {
            return Err(AppError::UserNotFound);
        }
        Ok(member)
    }

    /// Deletes refresh tokens that are expired or were revoked long ago.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        self.repo
            .delete_stale_tokens(now, now - Duration::days(REVOKED_TOKEN_RETENTION_DAYS))
            .await
    }
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
