//! Role capability checks.
//!
//! Sessions are owned by the platform's login layer, which forwards the
//! authenticated identity as request headers. The extractors here only
//! decide whether that identity may reach a handler.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use proctor::{AuditEntry, Role};

use crate::error::ApiError;

pub const ROLE_HEADER: &str = "x-proctor-role";
pub const USER_ID_HEADER: &str = "x-proctor-user-id";
pub const USERNAME_HEADER: &str = "x-proctor-username";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

impl Identity {
    pub fn audit<E: Into<String>>(&self, event_type: E) -> AuditEntry {
        AuditEntry::new(self.role, event_type).who(self.user_id, self.username.to_owned())
    }

    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        Some(Self {
            role: header(headers, ROLE_HEADER)?.parse().ok()?,
            user_id: header(headers, USER_ID_HEADER).and_then(|v| v.parse().ok()),
            username: header(headers, USERNAME_HEADER).map(str::to_owned),
        })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(ApiError::Unauthorized)
    }
}

macro_rules! role_guard {
    ($name:ident, $role:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub Identity);

        #[async_trait]
        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let identity = Identity::from_request_parts(parts, state).await?;

                if identity.role != $role {
                    return Err(ApiError::Unauthorized);
                }

                Ok(Self(identity))
            }
        }
    };
}

role_guard!(Teacher, Role::Teacher);
role_guard!(Student, Role::Student);
