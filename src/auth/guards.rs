use rocket::Request;
use rocket::State;
use rocket::request::{FromRequest, Outcome};
use serde::{Deserialize, Serialize};

use crate::auth::responses::Role;
use crate::auth::{AuthError, AuthResult, AuthState};
use crate::users::UserRecord;

/// Identity of the caller, decoded from a verified access token.
///
/// Handlers receive it as an explicit argument and pass it down to the
/// authorization checks; it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl From<&UserRecord> for Principal {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Principal {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_principal(request).await {
            Ok(principal) => Outcome::Success(principal),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

async fn extract_principal(request: &Request<'_>) -> AuthResult<Principal> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    auth_state.sessions.verify_access_token(token)
}

fn bearer_token_from_request<'a>(request: &'a Request<'_>) -> AuthResult<&'a str> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::InvalidToken)?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::InvalidToken)
    }
}
