use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::guards::Principal;
use crate::auth::responses::Role;
use crate::auth::{AuthConfig, AuthError, AuthResult};

const LEEWAY_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claim set shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub email: String,
    pub role: Role,
}

impl TokenClaims {
    pub fn user_id(&self) -> AuthResult<i32> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn principal(&self) -> AuthResult<Principal> {
        Ok(Principal {
            user_id: self.user_id()?,
            email: self.email.clone(),
            role: self.role,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct SigningKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }
}

/// Mints and verifies HS256 tokens; each [`TokenKind`] has its own secret.
pub struct JwtService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
    issuer: String,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.clone()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = LEEWAY_SECS;

        Ok(Self {
            access: SigningKeys::new(&config.access_token_secret, config.access_token_ttl_secs),
            refresh: SigningKeys::new(&config.refresh_token_secret, config.refresh_token_ttl_secs),
            validation,
            issuer: config.issuer.clone(),
        })
    }

    pub fn issue_access(&self, principal: &Principal) -> AuthResult<SignedToken> {
        self.issue(principal, TokenKind::Access)
    }

    pub fn issue_refresh(&self, principal: &Principal) -> AuthResult<SignedToken> {
        self.issue(principal, TokenKind::Refresh)
    }

    /// Check signature, expiry and claim shape under the secret for `kind`.
    ///
    /// Every failure reason maps to [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str, kind: TokenKind) -> AuthResult<TokenClaims> {
        let keys = self.keys(kind);
        let data = decode::<TokenClaims>(token, &keys.decoding_key, &self.validation).map_err(
            |err| {
                log::debug!("{} token rejected: {}", kind.as_str(), err);
                AuthError::InvalidToken
            },
        )?;
        data.claims.user_id()?;
        Ok(data.claims)
    }

    fn issue(&self, principal: &Principal, kind: TokenKind) -> AuthResult<SignedToken> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let expires_at = now + keys.ttl;

        let claims = TokenClaims {
            sub: principal.user_id.to_string(),
            iss: self.issuer.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            email: principal.email.clone(),
            role: principal.role,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
            .map_err(|err| AuthError::TokenEncoding(err.to_string()))?;

        Ok(SignedToken { token, expires_at })
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}
