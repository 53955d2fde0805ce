//! Review Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::reviews::records::ReviewRecord;

/// Review
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewModel {
    pub uuid: Uuid,
    pub book_uuid: Uuid,
    pub user_uuid: Uuid,

    /// 1 to 5 stars
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub helpful_count: u32,
    pub not_helpful_count: u32,

    /// The author bought the book
    pub verified: bool,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ReviewRecord> for ReviewModel {
    fn from(review: ReviewRecord) -> Self {
        Self {
            uuid: review.uuid.into(),
            book_uuid: review.book_uuid.into(),
            user_uuid: review.user_uuid.into(),
            rating: review.rating.get(),
            title: review.title,
            comment: review.comment,
            helpful_count: review.helpful_count,
            not_helpful_count: review.not_helpful_count,
            verified: review.verified,
            flagged: review.flagged,
            flag_reason: review.flag_reason,
            is_active: review.is_active,
            created_at: review.created_at.to_string(),
            updated_at: review.updated_at.to_string(),
        }
    }
}

/// Single Review Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewResponse {
    pub message: String,
    pub review: ReviewModel,
}

impl ReviewResponse {
    pub(crate) fn new(message: &str, review: ReviewRecord) -> Self {
        Self {
            message: message.to_string(),
            review: review.into(),
        }
    }
}
