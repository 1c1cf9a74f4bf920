//! Password strength rules applied when a password is set or changed.

use crate::auth::{AuthError, AuthResult};

pub const MIN_PASSWORD_LEN: usize = 6;

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password123",
    "123456",
    "123456789",
    "qwerty",
    "abc123",
    "password1",
    "admin",
    "admin123",
    "welcome",
    "welcome123",
    "letmein",
    "monkey",
    "dragon",
    "passw0rd",
];

const SEQUENCES: &[&str] = &[
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
];

const RUN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Reject passwords that are common, personal, sequential or repetitive.
    ///
    /// Checks run in a fixed order and the first violation is reported; the
    /// minimum length is checked last.
    pub fn validate_strength(
        &self,
        password: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> AuthResult<()> {
        let lowered = password.to_lowercase();

        if COMMON_PASSWORDS.contains(&lowered.as_str()) {
            return Err(weak(
                "Password is too common and easily guessable. Please choose a stronger password.",
            ));
        }

        if let Some(local_part) = email.and_then(|e| e.split('@').next()) {
            let local_part = local_part.to_lowercase();
            if !local_part.is_empty() && lowered.contains(&local_part) {
                return Err(weak("Password cannot contain your email username."));
            }
        }

        if let Some(name) = name {
            let name = name.to_lowercase();
            if !name.is_empty() && lowered.contains(&name) {
                return Err(weak("Password cannot contain your name."));
            }
        }

        if has_sequential_run(&lowered) {
            return Err(weak(
                "Password cannot contain sequential characters (e.g., 123, abc).",
            ));
        }

        if has_repeated_run(password) {
            return Err(weak(
                "Password cannot contain more than 2 consecutive identical characters.",
            ));
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(weak(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }

        Ok(())
    }
}

fn weak(reason: impl Into<String>) -> AuthError {
    AuthError::WeakPassword(reason.into())
}

fn has_sequential_run(lowered: &str) -> bool {
    SEQUENCES.iter().any(|sequence| {
        let chars: Vec<char> = sequence.chars().collect();
        chars.windows(RUN_LEN).any(|window| {
            let forward: String = window.iter().collect();
            let reverse: String = window.iter().rev().collect();
            lowered.contains(&forward) || lowered.contains(&reverse)
        })
    })
}

fn has_repeated_run(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars
        .windows(RUN_LEN)
        .any(|w| w[0] == w[1] && w[1] == w[2])
}
