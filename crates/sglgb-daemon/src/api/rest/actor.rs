//! Caller identity extraction
//!
//! Authentication happens upstream (the portal's gateway). The daemon trusts
//! three headers set by it:
//!
//! - `x-user-id`: the authenticated user
//! - `x-user-role`: `blgu_user`, `area_assessor` or `system_admin`
//! - `x-scope-id`: the barangay (BLGU users) or governance area (assessors)

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sglgb_types::{Actor, Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const SCOPE_HEADER: &str = "x-scope-id";

/// The actor making the request
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiError::Unauthorized(format!("{} is not valid text", name))),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)?
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {}", USER_ID_HEADER)))?;
        let role: Role = header(parts, ROLE_HEADER)?
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {}", ROLE_HEADER)))?
            .parse()
            .map_err(ApiError::Unauthorized)?;

        let scope_id = match role {
            Role::SystemAdmin => None,
            Role::BlguUser | Role::AreaAssessor => Some(
                header(parts, SCOPE_HEADER)?
                    .ok_or_else(|| {
                        ApiError::Unauthorized(format!("{} requires {}", role, SCOPE_HEADER))
                    })?
                    .to_string(),
            ),
        };

        Ok(CurrentActor(Actor {
            user_id: UserId::new(user_id),
            role,
            scope_id,
        }))
    }
}
