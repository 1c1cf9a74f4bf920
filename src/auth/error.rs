use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Failure kinds surfaced by the authentication core.
///
/// Token and credential failures are deliberately coarse: every reason a
/// refresh token can be rejected collapses into [`AuthError::InvalidToken`],
/// and an unknown email is indistinguishable from a wrong password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("{0}")]
    WeakPassword(String),
    #[error("permission denied")]
    PermissionDenied,
    #[error("user not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("user store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("token encoding error: {0}")]
    TokenEncoding(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidToken => Status::Unauthorized,
            AuthError::WeakPassword(_) | AuthError::InvalidInput(_) => Status::BadRequest,
            AuthError::PermissionDenied => Status::Forbidden,
            AuthError::NotFound => Status::NotFound,
            AuthError::Conflict(_) => Status::Conflict,
            AuthError::StoreUnavailable(_) => Status::ServiceUnavailable,
            AuthError::Config(_) | AuthError::PasswordHash(_) | AuthError::TokenEncoding(_) => {
                Status::InternalServerError
            }
        }
    }

    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::InvalidToken => "InvalidToken",
            AuthError::WeakPassword(_) => "WeakPassword",
            AuthError::PermissionDenied => "PermissionDenied",
            AuthError::NotFound => "NotFound",
            AuthError::Conflict(_) => "Conflict",
            AuthError::InvalidInput(_) => "InvalidInput",
            AuthError::StoreUnavailable(_) => "StoreUnavailable",
            AuthError::Config(_) => "ConfigError",
            AuthError::PasswordHash(_) | AuthError::TokenEncoding(_) => "InternalError",
        }
    }

    /// Whether the failure originates inside the service rather than from the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::StoreUnavailable(_)
                | AuthError::Config(_)
                | AuthError::PasswordHash(_)
                | AuthError::TokenEncoding(_)
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return AuthError::Conflict("User already exists".into());
        }
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AuthError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut reasons: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        reasons.sort();
        AuthError::InvalidInput(reasons.join("; "))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err
                .code()
                .map(|code| code == "23505")
                .unwrap_or(false)
    )
}
