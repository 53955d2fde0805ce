//! Carts Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    carts::records::{CartOwner, CartUuid, SessionId},
    users::records::UserUuid,
};

const ENSURE_CART_SQL: &str = include_str!("../sql/ensure_cart.sql");
const FIND_CART_SQL: &str = include_str!("../sql/find_cart.sql");
const LOCK_CART_SQL: &str = include_str!("../sql/lock_cart.sql");
const TOUCH_CART_SQL: &str = include_str!("../sql/touch_cart.sql");
const DELETE_CART_SQL: &str = include_str!("../sql/delete_cart.sql");

/// Cart row without its items.
#[derive(Debug, Clone)]
pub(crate) struct StoredCart {
    pub uuid: CartUuid,
    pub owner: CartOwner,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &CartOwner,
    ) -> Result<Option<StoredCart>, sqlx::Error> {
        let (user, session) = owner_binds(owner);

        query_as::<Postgres, StoredCart>(FIND_CART_SQL)
            .bind(user)
            .bind(session)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lock the owner's cart row, if it exists, serializing edits to it.
    pub(crate) async fn lock_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &CartOwner,
    ) -> Result<Option<StoredCart>, sqlx::Error> {
        let (user, session) = owner_binds(owner);

        query_as::<Postgres, StoredCart>(LOCK_CART_SQL)
            .bind(user)
            .bind(session)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Create the owner's cart if missing, then lock it.
    pub(crate) async fn ensure_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &CartOwner,
    ) -> Result<StoredCart, sqlx::Error> {
        let (user, session) = owner_binds(owner);

        query(ENSURE_CART_SQL)
            .bind(CartUuid::new())
            .bind(user)
            .bind(session)
            .execute(&mut **tx)
            .await?;

        self.lock_cart(tx, owner)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub(crate) async fn touch_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_CART_SQL)
            .bind(cart)
            .execute(&mut **tx)
            .await
            .map(|_| ())
    }

    pub(crate) async fn delete_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_SQL)
            .bind(cart)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn owner_binds(owner: &CartOwner) -> (Option<UserUuid>, Option<&str>) {
    match owner {
        CartOwner::User(user) => (Some(*user), None),
        CartOwner::Session(session) => (None, Some(session.as_str())),
    }
}

impl<'r> FromRow<'r, PgRow> for StoredCart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let user: Option<UserUuid> = row.try_get("user_uuid")?;
        let session: Option<String> = row.try_get("session_id")?;

        let owner = match (user, session) {
            (Some(user), _) => CartOwner::User(user),
            (None, Some(session)) => {
                CartOwner::Session(SessionId::parse(&session).map_err(|e| {
                    sqlx::Error::ColumnDecode {
                        index: "session_id".to_string(),
                        source: Box::new(e),
                    }
                })?)
            }
            (None, None) => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "user_uuid".to_string(),
                    source: "cart has no owner".into(),
                });
            }
        };

        Ok(Self {
            uuid: row.try_get("uuid")?,
            owner,
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
