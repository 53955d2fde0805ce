//! Reviews Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::try_get_count,
    domain::{
        Page,
        books::records::BookUuid,
        reviews::{
            data::NewReview,
            records::{BookRating, Rating, ReviewRecord, ReviewUuid, VoteDelta},
        },
        users::records::UserUuid,
    },
};

const CREATE_REVIEW_SQL: &str = include_str!("sql/create_review.sql");
const GET_REVIEW_SQL: &str = include_str!("sql/get_review.sql");
const LOCK_REVIEW_SQL: &str = include_str!("sql/lock_review.sql");
const LIST_REVIEWS_SQL: &str = include_str!("sql/list_reviews.sql");
const UPDATE_REVIEW_SQL: &str = include_str!("sql/update_review.sql");
const SET_REVIEW_ACTIVE_SQL: &str = include_str!("sql/set_review_active.sql");
const FLAG_REVIEW_SQL: &str = include_str!("sql/flag_review.sql");
const ADJUST_VOTE_COUNTS_SQL: &str = include_str!("sql/adjust_vote_counts.sql");
const FIND_VOTE_SQL: &str = include_str!("sql/find_vote.sql");
const UPSERT_VOTE_SQL: &str = include_str!("sql/upsert_vote.sql");
const HAS_PURCHASED_SQL: &str = include_str!("sql/has_purchased.sql");
const REFRESH_BOOK_RATING_SQL: &str = include_str!("sql/refresh_book_rating.sql");

/// Columns written by a review edit.
#[derive(Debug, Clone)]
pub(crate) struct ReviewChanges {
    pub rating: Rating,
    pub title: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReviewsRepository;

impl PgReviewsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        review: &NewReview,
        verified: bool,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(CREATE_REVIEW_SQL)
            .bind(review.uuid)
            .bind(review.book)
            .bind(user)
            .bind(i16::from(review.rating.get()))
            .bind(&review.title)
            .bind(&review.comment)
            .bind(verified)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(GET_REVIEW_SQL)
            .bind(review)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(LOCK_REVIEW_SQL)
            .bind(review)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_reviews(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
        page: Page,
    ) -> Result<Vec<ReviewRecord>, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(LIST_REVIEWS_SQL)
            .bind(book)
            .bind(page.limit_i64())
            .bind(page.offset_i64())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        changes: ReviewChanges,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(UPDATE_REVIEW_SQL)
            .bind(review)
            .bind(i16::from(changes.rating.get()))
            .bind(changes.title)
            .bind(changes.comment)
            .fetch_one(&mut **tx)
            .await
    }

    /// Show or hide a review. Showing it also clears any flag.
    pub(crate) async fn set_review_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        active: bool,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(SET_REVIEW_ACTIVE_SQL)
            .bind(review)
            .bind(active)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn flag_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        reason: &str,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(FLAG_REVIEW_SQL)
            .bind(review)
            .bind(reason)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_vote(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        user: UserUuid,
    ) -> Result<Option<bool>, sqlx::Error> {
        query_scalar::<Postgres, bool>(FIND_VOTE_SQL)
            .bind(review)
            .bind(user)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn upsert_vote(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        user: UserUuid,
        helpful: bool,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_VOTE_SQL)
            .bind(review)
            .bind(user)
            .bind(helpful)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn adjust_vote_counts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        delta: VoteDelta,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(ADJUST_VOTE_COUNTS_SQL)
            .bind(review)
            .bind(delta.helpful)
            .bind(delta.not_helpful)
            .fetch_one(&mut **tx)
            .await
    }

    /// Whether `user` has a non-cancelled order containing `book`.
    pub(crate) async fn has_purchased(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        book: BookUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(HAS_PURCHASED_SQL)
            .bind(user)
            .bind(book)
            .fetch_one(&mut **tx)
            .await
    }

    /// Recompute the book's average rating and review count from its active
    /// reviews. The caller must hold the book row lock.
    pub(crate) async fn refresh_book_rating(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<BookRating, sqlx::Error> {
        let row = query(REFRESH_BOOK_RATING_SQL)
            .bind(book)
            .fetch_one(&mut **tx)
            .await?;

        Ok(BookRating {
            average_rating: row.try_get("average_rating")?,
            review_count: try_get_count(&row, "review_count")?,
        })
    }
}

fn try_get_rating(row: &PgRow, col: &str) -> Result<Rating, sqlx::Error> {
    let raw: i16 = row.try_get(col)?;

    u8::try_from(raw)
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: col.to_string(),
            source: Box::new(e),
        })
        .and_then(|value| {
            Rating::new(value).map_err(|e| sqlx::Error::ColumnDecode {
                index: col.to_string(),
                source: Box::new(e),
            })
        })
}

impl<'r> FromRow<'r, PgRow> for ReviewRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            book_uuid: row.try_get("book_uuid")?,
            user_uuid: row.try_get("user_uuid")?,
            rating: try_get_rating(row, "rating")?,
            title: row.try_get("title")?,
            comment: row.try_get("comment")?,
            helpful_count: try_get_count(row, "helpful_count")?,
            not_helpful_count: try_get_count(row, "not_helpful_count")?,
            verified: row.try_get("verified")?,
            flagged: row.try_get("flagged")?,
            flag_reason: row.try_get("flag_reason")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
