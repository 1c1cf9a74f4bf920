//! Service-level HTTP handlers that sit outside the auth and user modules.

pub mod health;
