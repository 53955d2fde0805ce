//! Books service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        books::{
            data::{BookQuery, BookUpdate, NewBook},
            errors::BooksServiceError,
            records::{BookRecord, BookUuid},
            repository::{BookChanges, PgBooksRepository},
        },
        stock::{PgStockReconciler, ReconcileError, StockChange, StockLevel},
    },
};

#[derive(Debug, Clone)]
pub struct PgBooksService {
    db: Db,
    repository: PgBooksRepository,
    reconciler: PgStockReconciler,
}

impl PgBooksService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgBooksRepository::new(),
            reconciler: PgStockReconciler::new(),
        }
    }
}

/// Admins manage every book; sellers manage their own.
fn ensure_can_manage(actor: &Principal, book: &BookRecord) -> Result<(), BooksServiceError> {
    if actor.is_admin() || (actor.can_sell() && book.seller_uuid == actor.user) {
        Ok(())
    } else {
        Err(BooksServiceError::Forbidden)
    }
}

fn non_blank(value: &str) -> Result<(), BooksServiceError> {
    if value.trim().is_empty() {
        Err(BooksServiceError::InvalidData)
    } else {
        Ok(())
    }
}

impl From<ReconcileError> for BooksServiceError {
    fn from(error: ReconcileError) -> Self {
        match error {
            ReconcileError::NotFound => Self::NotFound,
            ReconcileError::Stock(error) => Self::Stock(error),
            ReconcileError::Sql(error) => Self::from(error),
        }
    }
}

#[async_trait]
impl BooksService for PgBooksService {
    async fn list_books(&self, query: BookQuery) -> Result<Vec<BookRecord>, BooksServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let books = self.repository.list_books(&mut tx, &query).await?;

        tx.commit().await?;

        Ok(books)
    }

    async fn get_book(&self, book: BookUuid) -> Result<BookRecord, BooksServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let book = self.repository.view_book(&mut tx, book).await?;

        tx.commit().await?;

        Ok(book)
    }

    #[tracing::instrument(
        name = "books.service.create_book",
        skip(self, actor, book),
        fields(book_uuid = %book.uuid, seller_uuid = %actor.user),
        err
    )]
    async fn create_book(
        &self,
        actor: Principal,
        book: NewBook,
    ) -> Result<BookRecord, BooksServiceError> {
        if !actor.can_sell() {
            return Err(BooksServiceError::Forbidden);
        }

        non_blank(&book.title)?;
        non_blank(&book.author)?;

        let status = StockLevel::initial_status(book.stock);

        let mut tx = self.db.begin_transaction().await?;

        let created = self
            .repository
            .create_book(&mut tx, actor.user, book, status)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    #[tracing::instrument(
        name = "books.service.update_book",
        skip(self, actor, update),
        fields(book_uuid = %book, actor_uuid = %actor.user),
        err
    )]
    async fn update_book(
        &self,
        actor: Principal,
        book: BookUuid,
        update: BookUpdate,
    ) -> Result<BookRecord, BooksServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .repository
            .lock_book(&mut tx, book)
            .await?
            .filter(|record| record.deleted_at.is_none())
            .ok_or(BooksServiceError::NotFound)?;

        ensure_can_manage(&actor, &current)?;

        let level = StockLevel {
            stock: current.stock,
            sales_count: current.sales_count,
            status: current.status,
            deleted: false,
        };

        let changes = BookChanges {
            title: update.title.unwrap_or(current.title),
            author: update.author.unwrap_or(current.author),
            description: update.description.or(current.description),
            price: update.price.unwrap_or(current.price),
            status: update
                .listed
                .map_or(current.status, |listed| level.listing(listed)),
        };

        non_blank(&changes.title)?;
        non_blank(&changes.author)?;

        let updated = self.repository.update_book(&mut tx, book, changes).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "books.service.delete_book",
        skip(self, actor),
        fields(book_uuid = %book, actor_uuid = %actor.user),
        err
    )]
    async fn delete_book(&self, actor: Principal, book: BookUuid) -> Result<(), BooksServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .repository
            .lock_book(&mut tx, book)
            .await?
            .filter(|record| record.deleted_at.is_none())
            .ok_or(BooksServiceError::NotFound)?;

        ensure_can_manage(&actor, &current)?;

        let level = StockLevel {
            stock: current.stock,
            sales_count: current.sales_count,
            status: current.status,
            deleted: false,
        };

        self.repository
            .delete_book(&mut tx, book, level.listing(false))
            .await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "books.service.adjust_stock",
        skip(self, actor),
        fields(book_uuid = %book, actor_uuid = %actor.user),
        err
    )]
    async fn adjust_stock(
        &self,
        actor: Principal,
        book: BookUuid,
        delta: i64,
    ) -> Result<BookRecord, BooksServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .repository
            .lock_book(&mut tx, book)
            .await?
            .filter(|record| record.deleted_at.is_none())
            .ok_or(BooksServiceError::NotFound)?;

        ensure_can_manage(&actor, &current)?;

        self.reconciler
            .adjust(&mut tx, book, StockChange::manual(delta))
            .await?;

        let updated = self.repository.get_book(&mut tx, book).await?;

        tx.commit().await?;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait BooksService: Send + Sync {
    /// Browse the catalog, newest first.
    async fn list_books(&self, query: BookQuery) -> Result<Vec<BookRecord>, BooksServiceError>;

    /// Retrieve a single book, counting the view.
    async fn get_book(&self, book: BookUuid) -> Result<BookRecord, BooksServiceError>;

    /// List a new book for sale under the acting seller.
    async fn create_book(
        &self,
        actor: Principal,
        book: NewBook,
    ) -> Result<BookRecord, BooksServiceError>;

    /// Edit a book's details or listing.
    async fn update_book(
        &self,
        actor: Principal,
        book: BookUuid,
        update: BookUpdate,
    ) -> Result<BookRecord, BooksServiceError>;

    /// Soft-delete a book.
    async fn delete_book(&self, actor: Principal, book: BookUuid) -> Result<(), BooksServiceError>;

    /// Add or remove stock by hand.
    async fn adjust_stock(
        &self,
        actor: Principal,
        book: BookUuid,
        delta: i64,
    ) -> Result<BookRecord, BooksServiceError>;
}
