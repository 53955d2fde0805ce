//! Books Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_to_db, count_to_db, try_get_amount, try_get_count, try_get_parsed},
    domain::{
        books::{
            data::{BookQuery, NewBook},
            records::{BookRecord, BookStatus, BookUuid},
        },
        users::records::UserUuid,
    },
};

const LIST_BOOKS_SQL: &str = include_str!("sql/list_books.sql");
const GET_BOOK_SQL: &str = include_str!("sql/get_book.sql");
const GET_BOOKS_SQL: &str = include_str!("sql/get_books.sql");
const VIEW_BOOK_SQL: &str = include_str!("sql/view_book.sql");
const LOCK_BOOK_SQL: &str = include_str!("sql/lock_book.sql");
const LOCK_BOOKS_SQL: &str = include_str!("sql/lock_books.sql");
const CREATE_BOOK_SQL: &str = include_str!("sql/create_book.sql");
const UPDATE_BOOK_SQL: &str = include_str!("sql/update_book.sql");
const DELETE_BOOK_SQL: &str = include_str!("sql/delete_book.sql");

/// Columns written by a book edit.
#[derive(Debug, Clone)]
pub(crate) struct BookChanges {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub price: u64,
    pub status: BookStatus,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBooksRepository;

impl PgBooksRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_books(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: &BookQuery,
    ) -> Result<Vec<BookRecord>, sqlx::Error> {
        query_as::<Postgres, BookRecord>(LIST_BOOKS_SQL)
            .bind(filter.search.as_deref().map(escape_like))
            .bind(filter.status.map(BookStatus::as_str))
            .bind(filter.seller)
            .bind(filter.page.limit_i64())
            .bind(filter.page.offset_i64())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<BookRecord, sqlx::Error> {
        query_as::<Postgres, BookRecord>(GET_BOOK_SQL)
            .bind(book)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<Option<BookRecord>, sqlx::Error> {
        query_as::<Postgres, BookRecord>(GET_BOOK_SQL)
            .bind(book)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fetch several non-deleted books without locking them.
    pub(crate) async fn get_books(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        books: &[BookUuid],
    ) -> Result<Vec<BookRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = books.iter().copied().map(BookUuid::into_uuid).collect();

        query_as::<Postgres, BookRecord>(GET_BOOKS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn view_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<BookRecord, sqlx::Error> {
        query_as::<Postgres, BookRecord>(VIEW_BOOK_SQL)
            .bind(book)
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock a book row, deleted or not, for the rest of the transaction.
    pub(crate) async fn lock_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<Option<BookRecord>, sqlx::Error> {
        query_as::<Postgres, BookRecord>(LOCK_BOOK_SQL)
            .bind(book)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lock several book rows in ascending uuid order.
    pub(crate) async fn lock_books(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        books: &[BookUuid],
    ) -> Result<Vec<BookRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = books.iter().copied().map(BookUuid::into_uuid).collect();

        query_as::<Postgres, BookRecord>(LOCK_BOOKS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        seller: UserUuid,
        book: NewBook,
        status: BookStatus,
    ) -> Result<BookRecord, sqlx::Error> {
        query_as::<Postgres, BookRecord>(CREATE_BOOK_SQL)
            .bind(book.uuid)
            .bind(seller)
            .bind(book.title)
            .bind(book.author)
            .bind(book.isbn)
            .bind(book.description)
            .bind(amount_to_db(book.price)?)
            .bind(count_to_db(book.stock)?)
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
        changes: BookChanges,
    ) -> Result<BookRecord, sqlx::Error> {
        query_as::<Postgres, BookRecord>(UPDATE_BOOK_SQL)
            .bind(book)
            .bind(changes.title)
            .bind(changes.author)
            .bind(changes.description)
            .bind(amount_to_db(changes.price)?)
            .bind(changes.status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
        status: BookStatus,
    ) -> Result<BookRecord, sqlx::Error> {
        query_as::<Postgres, BookRecord>(DELETE_BOOK_SQL)
            .bind(book)
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

/// Escape `ILIKE` wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());

    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }

        escaped.push(c);
    }

    escaped
}

impl<'r> FromRow<'r, PgRow> for BookRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            seller_uuid: row.try_get("seller_uuid")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            isbn: row.try_get("isbn")?,
            description: row.try_get("description")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_count(row, "stock")?,
            status: try_get_parsed(row, "status")?,
            sales_count: try_get_count(row, "sales_count")?,
            view_count: try_get_amount(row, "view_count")?,
            average_rating: row.try_get("average_rating")?,
            review_count: try_get_count(row, "review_count")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("100%_real\\"), "100\\%\\_real\\\\");
        assert_eq!(escape_like("Dune"), "Dune");
    }
}
