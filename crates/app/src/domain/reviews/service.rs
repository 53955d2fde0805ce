//! Reviews service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        Page,
        books::{PgBooksRepository, records::BookUuid},
        reviews::{
            data::{NewReview, ReviewUpdate},
            errors::ReviewsServiceError,
            records::{Moderation, ReviewRecord, ReviewUuid, VoteDelta},
            repository::{PgReviewsRepository, ReviewChanges},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgReviewsService {
    db: Db,
    repository: PgReviewsRepository,
    books_repository: PgBooksRepository,
}

impl PgReviewsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgReviewsRepository::new(),
            books_repository: PgBooksRepository::new(),
        }
    }

    /// Lock the book row so aggregate recomputations serialize.
    async fn lock_reviewed_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<(), ReviewsServiceError> {
        self.books_repository
            .lock_book(tx, book)
            .await?
            .ok_or(ReviewsServiceError::NotFound)
            .map(|_| ())
    }

    /// Lock the book, then the review. Inactive reviews are treated as gone.
    async fn lock_for_write(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        let book = self.repository.get_review(tx, review).await?.book_uuid;

        self.lock_reviewed_book(tx, book).await?;

        self.repository.lock_review(tx, review).await.map_err(Into::into)
    }
}

fn non_blank(value: &str) -> Result<(), ReviewsServiceError> {
    if value.trim().is_empty() {
        Err(ReviewsServiceError::InvalidData)
    } else {
        Ok(())
    }
}

#[async_trait]
impl ReviewsService for PgReviewsService {
    #[tracing::instrument(
        name = "reviews.service.create_review",
        skip(self, actor, review),
        fields(review_uuid = %review.uuid, book_uuid = %review.book, user_uuid = %actor.user),
        err
    )]
    async fn create_review(
        &self,
        actor: Principal,
        review: NewReview,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        non_blank(&review.title)?;
        non_blank(&review.comment)?;

        let mut tx = self.db.begin_transaction().await?;

        let book = self
            .books_repository
            .lock_book(&mut tx, review.book)
            .await?
            .filter(|book| book.deleted_at.is_none())
            .ok_or(ReviewsServiceError::BookUnavailable)?;

        let verified = self
            .repository
            .has_purchased(&mut tx, actor.user, book.uuid)
            .await?;

        let created = self
            .repository
            .create_review(&mut tx, actor.user, &review, verified)
            .await?;

        let rating = self
            .repository
            .refresh_book_rating(&mut tx, book.uuid)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            average_rating = rating.average_rating,
            review_count = rating.review_count,
            "book rating refreshed"
        );

        Ok(created)
    }

    async fn get_review(&self, review: ReviewUuid) -> Result<ReviewRecord, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let review = self.repository.get_review(&mut tx, review).await?;

        tx.commit().await?;

        if !review.is_active {
            return Err(ReviewsServiceError::NotFound);
        }

        Ok(review)
    }

    async fn list_reviews(
        &self,
        book: BookUuid,
        page: Page,
    ) -> Result<Vec<ReviewRecord>, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let reviews = self.repository.list_reviews(&mut tx, book, page).await?;

        tx.commit().await?;

        Ok(reviews)
    }

    #[tracing::instrument(
        name = "reviews.service.update_review",
        skip(self, actor, update),
        fields(review_uuid = %review, user_uuid = %actor.user),
        err
    )]
    async fn update_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
        update: ReviewUpdate,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.lock_for_write(&mut tx, review).await?;

        if !current.is_active {
            return Err(ReviewsServiceError::NotFound);
        }

        if current.user_uuid != actor.user {
            return Err(ReviewsServiceError::Forbidden);
        }

        let changes = ReviewChanges {
            rating: update.rating.unwrap_or(current.rating),
            title: update.title.unwrap_or(current.title),
            comment: update.comment.unwrap_or(current.comment),
        };

        non_blank(&changes.title)?;
        non_blank(&changes.comment)?;

        let updated = self
            .repository
            .update_review(&mut tx, review, changes)
            .await?;

        self.repository
            .refresh_book_rating(&mut tx, updated.book_uuid)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "reviews.service.delete_review",
        skip(self, actor),
        fields(review_uuid = %review, user_uuid = %actor.user),
        err
    )]
    async fn delete_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
    ) -> Result<(), ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.lock_for_write(&mut tx, review).await?;

        if !current.is_active {
            return Err(ReviewsServiceError::NotFound);
        }

        if current.user_uuid != actor.user && !actor.is_admin() {
            return Err(ReviewsServiceError::Forbidden);
        }

        self.repository
            .set_review_active(&mut tx, review, false)
            .await?;

        self.repository
            .refresh_book_rating(&mut tx, current.book_uuid)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "reviews.service.vote",
        skip(self, actor),
        fields(review_uuid = %review, user_uuid = %actor.user),
        err
    )]
    async fn vote(
        &self,
        actor: Principal,
        review: ReviewUuid,
        helpful: bool,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.repository.lock_review(&mut tx, review).await?;

        if !current.is_active {
            return Err(ReviewsServiceError::NotFound);
        }

        if current.user_uuid == actor.user {
            return Err(ReviewsServiceError::OwnReview);
        }

        let previous = self
            .repository
            .find_vote(&mut tx, review, actor.user)
            .await?;

        let delta = VoteDelta::between(previous, helpful);

        if delta.is_noop() {
            tx.commit().await?;

            return Ok(current);
        }

        self.repository
            .upsert_vote(&mut tx, review, actor.user, helpful)
            .await?;

        let updated = self
            .repository
            .adjust_vote_counts(&mut tx, review, delta)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "reviews.service.flag_review",
        skip(self, actor, reason),
        fields(review_uuid = %review, user_uuid = %actor.user),
        err
    )]
    async fn flag_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
        reason: String,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        non_blank(&reason)?;

        let mut tx = self.db.begin_transaction().await?;

        let current = self.repository.lock_review(&mut tx, review).await?;

        if !current.is_active {
            return Err(ReviewsServiceError::NotFound);
        }

        let flagged = self
            .repository
            .flag_review(&mut tx, review, reason.trim())
            .await?;

        tx.commit().await?;

        Ok(flagged)
    }

    #[tracing::instrument(
        name = "reviews.service.moderate_review",
        skip(self, actor),
        fields(review_uuid = %review, user_uuid = %actor.user, decision = %decision),
        err
    )]
    async fn moderate_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
        decision: Moderation,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        if !actor.is_admin() {
            return Err(ReviewsServiceError::Forbidden);
        }

        let mut tx = self.db.begin_transaction().await?;

        let current = self.lock_for_write(&mut tx, review).await?;

        if !current.is_active {
            return Err(ReviewsServiceError::NotFound);
        }

        let moderated = self
            .repository
            .set_review_active(&mut tx, review, decision.keeps_active())
            .await?;

        self.repository
            .refresh_book_rating(&mut tx, moderated.book_uuid)
            .await?;

        tx.commit().await?;

        Ok(moderated)
    }
}

#[automock]
#[async_trait]
pub trait ReviewsService: Send + Sync {
    /// Review a book. Marked verified when the author bought it.
    async fn create_review(
        &self,
        actor: Principal,
        review: NewReview,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Retrieve an active review.
    async fn get_review(&self, review: ReviewUuid) -> Result<ReviewRecord, ReviewsServiceError>;

    /// List active reviews of a book, newest first.
    async fn list_reviews(
        &self,
        book: BookUuid,
        page: Page,
    ) -> Result<Vec<ReviewRecord>, ReviewsServiceError>;

    /// Edit a review. Only its author may.
    async fn update_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
        update: ReviewUpdate,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Soft-delete a review. Its author or an admin may.
    async fn delete_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
    ) -> Result<(), ReviewsServiceError>;

    /// Record or change the actor's helpfulness vote.
    async fn vote(
        &self,
        actor: Principal,
        review: ReviewUuid,
        helpful: bool,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Report a review for moderation.
    async fn flag_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
        reason: String,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Approve or remove an active review. Admin only; removal is final.
    async fn moderate_review(
        &self,
        actor: Principal,
        review: ReviewUuid,
        decision: Moderation,
    ) -> Result<ReviewRecord, ReviewsServiceError>;
}
