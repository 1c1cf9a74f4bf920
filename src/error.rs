use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::auth::AuthError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &AuthError) -> Self {
        // Internal details are logged, not returned.
        let message = if err.is_internal() {
            match err {
                AuthError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            err.to_string()
        };

        Self {
            error: err.kind().to_string(),
            message,
        }
    }
}

impl<'r> Responder<'r, 'static> for AuthError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status: Status = self.status();
        if self.is_internal() {
            log::error!("request failed: {}", self);
        } else {
            log::debug!("request rejected: {}", self);
        }

        let json = serde_json::to_string(&ErrorResponse::from_error(&self)).unwrap_or_else(|_| {
            r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}
