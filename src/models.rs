use serde::{Deserialize, Serialize};

/// Envelope for successful account responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(message: impl Into<String>, data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            message: message.into(),
            data,
            count: Some(count),
        }
    }
}
