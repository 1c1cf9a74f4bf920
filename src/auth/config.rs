use crate::auth::{AuthError, AuthResult};

const DEFAULT_ACCESS_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Authentication configuration loaded from environment variables.
///
/// Access and refresh tokens are signed with independent secrets; a config
/// where both secrets are equal is rejected by [`AuthConfig::validate`].
#[derive(Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub refresh_cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let issuer =
            std::env::var("ACCOUNTS_JWT_ISSUER").unwrap_or_else(|_| "accounts-api".into());
        let access_token_secret = std::env::var("ACCOUNTS_JWT_ACCESS_SECRET").map_err(|_| {
            AuthError::Config("ACCOUNTS_JWT_ACCESS_SECRET is required".into())
        })?;
        let refresh_token_secret = std::env::var("ACCOUNTS_JWT_REFRESH_SECRET").map_err(|_| {
            AuthError::Config("ACCOUNTS_JWT_REFRESH_SECRET is required".into())
        })?;
        let access_token_ttl_secs = std::env::var("ACCOUNTS_ACCESS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_ACCESS_TTL_SECS);
        let refresh_token_ttl_secs = std::env::var("ACCOUNTS_REFRESH_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_REFRESH_TTL_SECS);
        let refresh_cookie_name = std::env::var("ACCOUNTS_REFRESH_COOKIE_NAME")
            .unwrap_or_else(|_| "refreshToken".into());
        let cookie_secure = std::env::var("ACCOUNTS_COOKIE_SECURE")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "on"))
            .unwrap_or(true);

        let config = Self {
            issuer,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            refresh_cookie_name,
            cookie_secure,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.access_token_secret.is_empty() || self.refresh_token_secret.is_empty() {
            return Err(AuthError::Config("signing secrets must not be empty".into()));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(AuthError::Config(
                "access and refresh tokens must be signed with different secrets".into(),
            ));
        }
        if self.access_token_ttl_secs <= 0 || self.refresh_token_ttl_secs <= 0 {
            return Err(AuthError::Config("token TTLs must be positive".into()));
        }
        Ok(())
    }
}

// Secrets are redacted so configs can be logged safely.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("access_token_secret", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("refresh_cookie_name", &self.refresh_cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            issuer: "https://accounts.test".into(),
            access_token_secret: "access-secret".into(),
            refresh_token_secret: "refresh-secret".into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            refresh_cookie_name: "refreshToken".into(),
            cookie_secure: false,
        }
    }

    #[test]
    fn accepts_distinct_secrets() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_shared_signing_secret() {
        let mut config = config();
        config.refresh_token_secret = config.access_token_secret.clone();
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let mut config = config();
        config.access_token_ttl_secs = 0;
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("access-secret"));
        assert!(!rendered.contains("refresh-secret"));
    }
}
