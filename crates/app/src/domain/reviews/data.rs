//! Reviews Data

use crate::domain::{
    books::records::BookUuid,
    reviews::records::{Rating, ReviewUuid},
};

/// New Review Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub uuid: ReviewUuid,
    pub book: BookUuid,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
}

/// Review Update Data. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub rating: Option<Rating>,
    pub title: Option<String>,
    pub comment: Option<String>,
}
