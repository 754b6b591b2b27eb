mod common;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use taskboard::auth::hash_token;
use taskboard::models::{NewMember, ProfileUpdate, RefreshToken};
use taskboard::repository::TokenRepository;
use taskboard::{AppError, ErrorKind};
use uuid::Uuid;

use common::{context, register, PASSWORD};

#[actix_rt::test]
async fn test_register_succeeds_once() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;
    assert_eq!(ada.email, "ada@example.com");
    assert_ne!(ada.password_hash, PASSWORD);

    let same_email = ctx
        .state
        .identity
        .register(NewMember {
            email: "ada@example.com".into(),
            username: "someone_else".into(),
            full_name: None,
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert_eq!(same_email.kind(), ErrorKind::AlreadyExists);

    let same_username = ctx
        .state
        .identity
        .register(NewMember {
            email: "other@example.com".into(),
            username: "ada".into(),
            full_name: None,
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(same_username, AppError::UserAlreadyExists));
}

#[actix_rt::test]
async fn test_register_rejects_short_password() {
    let ctx = context();
    let err = ctx
        .state
        .identity
        .register(NewMember {
            email: "short@example.com".into(),
            username: "short".into(),
            full_name: None,
            password: "1234567".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = context();
    register(&ctx.state, "ada").await;

    let wrong_password = ctx
        .state
        .identity
        .login("ada@example.com", "not-the-password")
        .await
        .unwrap_err();
    let unknown_email = ctx
        .state
        .identity
        .login("nobody@example.com", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown_email, AppError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[actix_rt::test]
async fn test_login_issues_usable_tokens() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;

    let auth = ctx
        .state
        .identity
        .login("ada@example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(auth.expires_in, 900);
    assert_eq!(auth.member.id, ada.id);

    let claims = ctx.tokens.validate_access(&auth.access_token).unwrap();
    assert_eq!(claims.sub, ada.id);
    assert_eq!(claims.username, "ada");

    let stored = ctx
        .repo
        .find_active_refresh_token(&hash_token(&auth.refresh_token), Utc::now())
        .await
        .unwrap();
    assert_eq!(stored.map(|t| t.member_id), Some(ada.id));

    let authenticated = ctx
        .state
        .identity
        .authenticate(&auth.access_token)
        .await
        .unwrap();
    assert_eq!(authenticated.id(), ada.id);
}

#[actix_rt::test]
async fn test_refresh_until_revoked() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;
    let auth = ctx
        .state
        .identity
        .login("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let refreshed = ctx
        .state
        .identity
        .refresh(&auth.refresh_token)
        .await
        .unwrap();
    assert_eq!(refreshed.member.id, ada.id);
    assert!(ctx.tokens.validate_access(&refreshed.access_token).is_ok());

    // Not rotated: the same refresh token keeps working.
    assert!(ctx.state.identity.refresh(&auth.refresh_token).await.is_ok());

    ctx.state.identity.logout(&auth.refresh_token).await.unwrap();

    assert_eq!(
        ctx.tokens.validate_refresh(&auth.refresh_token).unwrap(),
        ada.id
    );
    let err = ctx
        .state
        .identity
        .refresh(&auth.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRefreshToken));

    let err = ctx
        .state
        .identity
        .logout(&auth.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRefreshToken));
}

#[actix_rt::test]
async fn test_refresh_rejects_unknown_and_malformed_tokens() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;

    let err = ctx.state.identity.refresh("garbage").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRefreshToken));

    // Cryptographically valid but never persisted.
    let unpersisted = ctx.tokens.issue_refresh(ada.id).unwrap();
    let err = ctx
        .state
        .identity
        .refresh(&unpersisted.token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRefreshToken));

    // An access token is not a refresh token.
    let (access, _) = ctx.tokens.issue_access(&ada).unwrap();
    let err = ctx.state.identity.refresh(&access).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRefreshToken));
}

#[actix_rt::test]
async fn test_refresh_rejects_expired_stored_record() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;

    // The JWT itself is still valid; only the stored record has lapsed.
    let issued = ctx.tokens.issue_refresh(ada.id).unwrap();
    ctx.repo
        .insert_refresh_token(&RefreshToken::new(
            ada.id,
            issued.token_hash.clone(),
            Utc::now() - Duration::seconds(1),
        ))
        .await
        .unwrap();
    assert_eq!(ctx.tokens.validate_refresh(&issued.token).unwrap(), ada.id);

    let err = ctx
        .state
        .identity
        .refresh(&issued.token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRefreshToken));
}

#[actix_rt::test]
async fn test_refresh_for_missing_member() {
    let ctx = context();
    let ghost = Uuid::new_v4();
    let issued = ctx.tokens.issue_refresh(ghost).unwrap();
    ctx.repo
        .insert_refresh_token(&RefreshToken::new(
            ghost,
            issued.token_hash.clone(),
            issued.expires_at,
        ))
        .await
        .unwrap();

    let err = ctx
        .state
        .identity
        .refresh(&issued.token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[actix_rt::test]
async fn test_revoke_all_sessions() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;
    let first = ctx
        .state
        .identity
        .login("ada@example.com", PASSWORD)
        .await
        .unwrap();
    let second = ctx
        .state
        .identity
        .login("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let revoked = ctx.state.identity.revoke_all_sessions(ada.id).await.unwrap();
    assert_eq!(revoked, 2);

    for token in [&first.refresh_token, &second.refresh_token] {
        let err = ctx.state.identity.refresh(token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRefreshToken));
    }
}

#[actix_rt::test]
async fn test_authenticate_rejects_tokens_of_missing_members() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;
    let mut stranger = ada.clone();
    stranger.id = Uuid::new_v4();

    let (token, _) = ctx.tokens.issue_access(&stranger).unwrap();
    let err = ctx.state.identity.authenticate(&token).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));
}

#[actix_rt::test]
async fn test_update_profile_checks_uniqueness() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;
    register(&ctx.state, "grace").await;

    let err = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                email: Some("grace@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailAlreadyTaken));

    let err = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                username: Some("grace".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UsernameAlreadyTaken));

    // Re-submitting one's own values is not a conflict.
    let unchanged = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                email: Some("ada@example.com".into()),
                username: Some("ada".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.email, "ada@example.com");
}

#[actix_rt::test]
async fn test_update_profile_is_partial() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;

    let named = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                full_name: Some(Some("Ada Lovelace".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(named.full_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(named.username, "ada");
    assert_eq!(named.password_hash, ada.password_hash);

    let renamed = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                username: Some("countess".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.full_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(renamed.username, "countess");

    let cleared = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                full_name: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.full_name, None);
}

#[actix_rt::test]
async fn test_update_profile_password() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;

    let err = ctx
        .state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                password: Some("short".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    ctx.state
        .identity
        .update_profile(
            ada.id,
            ProfileUpdate {
                password: Some("a-much-longer-password".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(ctx
        .state
        .identity
        .login("ada@example.com", PASSWORD)
        .await
        .is_err());
    assert!(ctx
        .state
        .identity
        .login("ada@example.com", "a-much-longer-password")
        .await
        .is_ok());
}

#[actix_rt::test]
async fn test_update_profile_of_missing_member() {
    let ctx = context();
    let err = ctx
        .state
        .identity
        .update_profile(Uuid::new_v4(), ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[actix_rt::test]
async fn test_purge_expired_tokens() {
    let ctx = context();
    let ada = register(&ctx.state, "ada").await;
    let auth = ctx
        .state
        .identity
        .login("ada@example.com", PASSWORD)
        .await
        .unwrap();

    ctx.repo
        .insert_refresh_token(&RefreshToken::new(
            ada.id,
            "stale".into(),
            Utc::now() - Duration::minutes(1),
        ))
        .await
        .unwrap();

    assert_eq!(ctx.state.identity.purge_expired_tokens().await.unwrap(), 1);
    assert_eq!(ctx.state.identity.purge_expired_tokens().await.unwrap(), 0);
    assert!(ctx.state.identity.refresh(&auth.refresh_token).await.is_ok());
}
