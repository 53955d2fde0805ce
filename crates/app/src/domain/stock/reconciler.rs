//! Stock Reconciler

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use thiserror::Error;

use crate::{
    database::{count_to_db, try_get_count, try_get_parsed},
    domain::{
        books::records::BookUuid,
        stock::{StockChange, StockError, StockLevel},
    },
};

const LOCK_STOCK_LEVEL_SQL: &str = include_str!("sql/lock_stock_level.sql");
const WRITE_STOCK_LEVEL_SQL: &str = include_str!("sql/write_stock_level.sql");

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("book not found")]
    NotFound,

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStockReconciler;

impl PgStockReconciler {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Lock the book row, apply `change`, and write the result back inside
    /// the caller's transaction. Callers touching several books must call this
    /// in ascending uuid order.
    #[tracing::instrument(
        name = "stock.reconciler.adjust",
        skip(self, tx),
        fields(book_uuid = %book, stock_delta = change.stock, sales_delta = change.sales),
        err
    )]
    pub(crate) async fn adjust(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
        change: StockChange,
    ) -> Result<StockLevel, ReconcileError> {
        let current = query_as::<Postgres, StockLevel>(LOCK_STOCK_LEVEL_SQL)
            .bind(book)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ReconcileError::NotFound)?;

        let next = current.apply(change)?;

        query(WRITE_STOCK_LEVEL_SQL)
            .bind(book)
            .bind(count_to_db(next.stock)?)
            .bind(count_to_db(next.sales_count)?)
            .bind(next.status.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(next)
    }
}

impl<'r> FromRow<'r, PgRow> for StockLevel {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            stock: try_get_count(row, "stock")?,
            sales_count: try_get_count(row, "sales_count")?,
            status: try_get_parsed(row, "status")?,
            deleted: row.try_get("deleted")?,
        })
    }
}
