//! Response shapes shared across routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bare acknowledgement; also the shape of every error body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
