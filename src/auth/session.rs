//! Login, refresh-token rotation and revocation.
//!
//! A user is Anonymous until a successful login stores the digest of a fresh
//! refresh token on their record. Each refresh consumes that token and
//! replaces the digest (rotation); revocation clears it. Only one refresh
//! token is live per user, so a new login ends any previous session.

use std::sync::Arc;

use crate::auth::guards::Principal;
use crate::auth::jwt::{JwtService, SignedToken, TokenKind};
use crate::auth::passwords::PasswordService;
use crate::auth::{AuthError, AuthResult};
use crate::users::UserStore;

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: SignedToken,
    pub refresh_token: SignedToken,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user_id: i32,
    pub email: String,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    tokens: Arc<JwtService>,
    passwords: Arc<PasswordService>,
    // Verified against when the email is unknown so both rejection paths cost the same.
    decoy_hash: String,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: Arc<JwtService>,
        passwords: Arc<PasswordService>,
    ) -> AuthResult<Self> {
        let decoy_hash = passwords.hash_password(&uuid::Uuid::new_v4().to_string())?;
        Ok(Self {
            store,
            tokens,
            passwords,
            decoy_hash,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginOutcome> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.passwords.verify_password(password, &self.decoy_hash);
                log::info!("login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.passwords.verify_password(password, &user.password_hash) {
            log::info!("login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let principal = Principal::from(&user);
        let (tokens, refresh_hash) = self.mint_pair(&principal)?;

        match self
            .store
            .set_refresh_token_hash(user.id, Some(refresh_hash))
            .await
        {
            Ok(()) => {}
            // Deleted between lookup and write.
            Err(AuthError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(err) => return Err(err),
        }

        log::info!("user {} logged in", user.id);
        Ok(LoginOutcome {
            tokens,
            user_id: user.id,
            email: user.email,
        })
    }

    /// Exchange a refresh token for a new pair, consuming the presented token.
    pub async fn refresh(&self, presented: &str) -> AuthResult<TokenPair> {
        let claims = self.tokens.verify(presented, TokenKind::Refresh)?;
        let user_id = claims.user_id()?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let Some(stored_hash) = user.refresh_token_hash.as_deref() else {
            log::info!("refresh rejected for user {}: no active session", user_id);
            return Err(AuthError::InvalidToken);
        };

        if !self.passwords.verify_password(presented, stored_hash) {
            log::warn!(
                "refresh rejected for user {}: token does not match the live session",
                user_id
            );
            return Err(AuthError::InvalidToken);
        }

        // Claims come from the current record so role changes apply on rotation.
        let principal = Principal::from(&user);
        let (tokens, refresh_hash) = self.mint_pair(&principal)?;

        let rotated = self
            .store
            .swap_refresh_token_hash(user.id, stored_hash, Some(refresh_hash))
            .await?;
        if !rotated {
            log::warn!(
                "refresh rejected for user {}: session rotated concurrently",
                user_id
            );
            return Err(AuthError::InvalidToken);
        }

        log::debug!("rotated refresh token for user {}", user_id);
        Ok(tokens)
    }

    /// Clear the stored refresh-token digest for `user_id`.
    pub async fn revoke(&self, user_id: i32) -> AuthResult<()> {
        self.store.set_refresh_token_hash(user_id, None).await?;
        log::info!("revoked session for user {}", user_id);
        Ok(())
    }

    /// Revoke the caller's own session; a missing account has nothing to revoke.
    pub async fn logout(&self, principal: &Principal) -> AuthResult<()> {
        match self.revoke(principal.user_id).await {
            Ok(()) | Err(AuthError::NotFound) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Decode an access token into the caller's identity without touching the store.
    pub fn verify_access_token(&self, token: &str) -> AuthResult<Principal> {
        self.tokens.verify(token, TokenKind::Access)?.principal()
    }

    fn mint_pair(&self, principal: &Principal) -> AuthResult<(TokenPair, String)> {
        let access_token = self.tokens.issue_access(principal)?;
        let refresh_token = self.tokens.issue_refresh(principal)?;
        let refresh_hash = self.passwords.hash_password(&refresh_token.token)?;
        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            refresh_hash,
        ))
    }
}
