//! Authentication core: configuration, password handling, token minting,
//! session rotation, authorization decisions, request guards and routes.

use std::sync::Arc;

pub mod authorization;
pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod policy;
pub mod responses;
pub mod routes;
pub mod session;

pub use authorization::{AuthorizationPolicy, Operation};
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::Principal;
pub use jwt::{JwtService, TokenKind};
pub use passwords::PasswordService;
pub use policy::PasswordPolicy;
pub use responses::Role;
pub use session::{SessionManager, TokenPair};

use crate::users::{UserService, UserStore};

/// Services shared by every request, composed from one [`UserStore`].
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub sessions: Arc<SessionManager>,
    pub users: Arc<UserService>,
}

impl AuthState {
    pub fn new(config: AuthConfig, store: Arc<dyn UserStore>) -> AuthResult<Self> {
        config.validate()?;
        let password_service = Arc::new(PasswordService::new()?);
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let sessions = SessionManager::new(store.clone(), jwt_service, password_service.clone())?;
        let users = UserService::new(store, password_service);

        Ok(Self {
            config,
            sessions: Arc::new(sessions),
            users: Arc::new(users),
        })
    }
}
