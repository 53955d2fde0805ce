//! Shared response models.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

/// Message Response, for operations with nothing else to return
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
