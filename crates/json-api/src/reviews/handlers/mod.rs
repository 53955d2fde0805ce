//! Review Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod flag;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod moderate;
pub(crate) mod update;
pub(crate) mod vote;

const MAX_TITLE_LEN: usize = 100;
const MAX_COMMENT_LEN: usize = 2_000;

#[cfg(test)]
mod tests {
    use bookstore_app::domain::{
        books::records::BookUuid,
        reviews::records::{Rating, ReviewRecord, ReviewUuid},
    };
    use jiff::Timestamp;

    use crate::test_helpers::TEST_USER_UUID;

    pub(crate) fn make_review(uuid: ReviewUuid, book: BookUuid, rating: Rating) -> ReviewRecord {
        ReviewRecord {
            uuid,
            book_uuid: book,
            user_uuid: TEST_USER_UUID,
            rating,
            title: "A classic".to_string(),
            comment: "Still holds up.".to_string(),
            helpful_count: 0,
            not_helpful_count: 0,
            verified: true,
            flagged: false,
            flag_reason: None,
            is_active: true,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }
}
