//! Access and refresh token issuance and verification.
//!
//! Both token kinds are HS256 JWTs signed with the secret from [`JwtConfig`]. Access
//! tokens are verified purely cryptographically. Refresh tokens additionally have their
//! SHA-256 digest persisted (see [`hash_token`]) so they can be revoked.

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::models::Member;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Member id.
    pub sub: Uuid,
    pub email: String,
    pub username: String,
    pub typ: TokenType,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. `jti` makes every issued token distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub typ: TokenType,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// A freshly signed refresh token and the digest the caller must persist.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl: i64,
    refresh_token_ttl: i64,
}

impl TokenManager {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret().as_bytes()),
            access_token_ttl: config.access_token_ttl(),
            refresh_token_ttl: config.refresh_token_ttl(),
        }
    }

    /// Lifetime of access tokens in seconds, reported to clients as `expires_in`.
    pub fn access_token_ttl(&self) -> i64 {
        self.access_token_ttl
    }

    pub fn issue_access(&self, member: &Member) -> Result<(String, i64), AppError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: member.id,
            email: member.email.clone(),
            username: member.username.clone(),
            typ: TokenType::Access,
            iat: now,
            nbf: now,
            exp: now + self.access_token_ttl,
        };
        Ok((self.sign(&claims)?, self.access_token_ttl))
    }

    pub fn issue_refresh(&self, member_id: Uuid) -> Result<IssuedRefreshToken, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.refresh_token_ttl);
        let claims = RefreshClaims {
            sub: member_id,
            jti: Uuid::new_v4(),
            typ: TokenType::Refresh,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok(IssuedRefreshToken {
            token_hash: hash_token(&token),
            token,
            expires_at,
        })
    }

    /// Fails with `ExpiredToken` past expiry and `InvalidToken` for anything else.
    pub fn validate_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        let claims: AccessClaims = self.verify(token)?;
        if claims.typ != TokenType::Access {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    /// Cryptographic check only. The caller still has to consult the persisted record.
    pub fn validate_refresh(&self, token: &str) -> Result<Uuid, AppError> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.typ != TokenType::Refresh {
            return Err(AppError::InvalidToken);
        }
        Ok(claims.sub)
    }

    pub(crate) fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AppError> {
        decode::<T>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(AppError::from)
    }

    fn validation(&self) -> Validation {
        // Validation::new pins the accepted algorithm list to exactly one entry.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);
        validation
    }
}

/// Hex-encoded SHA-256 digest of a token, the form in which refresh tokens are stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
