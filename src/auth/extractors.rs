use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Member;

/// The member behind a verified access token.
///
/// Only the identity service can construct one, after the token has been validated and
/// the member loaded. `AuthMiddleware` stores it in the request extensions; handlers take
/// it as an argument.
#[derive(Debug, Clone)]
pub struct AuthenticatedMember {
    member: Member,
}

impl AuthenticatedMember {
    pub(crate) fn new(member: Member) -> Self {
        Self { member }
    }

    pub fn id(&self) -> Uuid {
        self.member.id
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn into_member(self) -> Member {
        self.member
    }
}

impl FromRequest for AuthenticatedMember {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedMember>().cloned() {
            Some(member) => ready(Ok(member)),
            None => {
                let err = AppError::Unauthorized("Missing or invalid bearer token".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMember;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn member() -> Member {
        Member::new(
            NewMember {
                email: "ada@example.com".into(),
                username: "ada".into(),
                full_name: None,
                password: "unused".into(),
            },
            "hash".into(),
        )
    }

    #[actix_rt::test]
    async fn test_authenticated_member_extractor_success() {
        let member = member();
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut()
            .insert(AuthenticatedMember::new(member.clone()));

        let mut payload = Payload::None;
        let extracted = AuthenticatedMember::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.id(), member.id);
        assert_eq!(extracted.member().username, "ada");
    }

    #[actix_rt::test]
    async fn test_authenticated_member_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedMember::from_request(&req, &mut payload).await;

        let err = result.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
