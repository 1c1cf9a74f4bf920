use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

/// One-way salted hashing for passwords and refresh tokens.
///
/// Each digest is a PHC string carrying its own random salt and cost
/// parameters, so verification needs nothing but the stored value.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(19 * 1024); // 19 MiB
        builder.t_cost(2);
        builder.p_cost(1);
        let params = builder.build().map_err(AuthError::from)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthError::from)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthError::from)?
            .to_string();
        Ok(hash)
    }

    /// Compare `password` against a stored digest.
    ///
    /// Malformed digests yield `false` rather than an error.
    pub fn verify_password(&self, password: &str, encoded: &str) -> bool {
        let parsed = match PasswordHash::new(encoded) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("stored digest could not be parsed: {}", err);
                return false;
            }
        };
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(err) => {
                log::debug!("digest verification failed: {}", err);
                false
            }
        }
    }
}
