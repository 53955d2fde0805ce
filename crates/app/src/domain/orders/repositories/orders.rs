//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::{
    database::{amount_to_db, try_get_amount, try_get_parsed},
    domain::{
        orders::{
            data::{IdempotencyKey, OrderQuery},
            records::{
                Address, OrderRecord, OrderStatus, OrderUuid, PaymentMethod, PaymentStatus,
            },
        },
        pricing::PriceBreakdown,
        users::records::UserUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const FIND_ORDER_BY_IDEMPOTENCY_KEY_SQL: &str =
    include_str!("../sql/find_order_by_idempotency_key.sql");
const LOCK_IDEMPOTENCY_KEY_SQL: &str = include_str!("../sql/lock_idempotency_key.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("../sql/list_orders.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");

/// Order header row to insert.
#[derive(Debug, Clone)]
pub(crate) struct NewOrderRow<'a> {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub totals: PriceBreakdown,
    pub shipping_address: &'a Address,
    pub billing_address: &'a Address,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Option<&'a IdempotencyKey>,
}

/// Which orders a listing may return.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OrderVisibility {
    All,
    PlacedBy(UserUuid),
    PlacedOrSoldBy(UserUuid),
}

/// Status columns written by a transition.
#[derive(Debug, Clone)]
pub(crate) struct StatusWrite {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the order header. Returns `None` when another order already
    /// holds the same `(user, idempotency key)`.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrderRow<'_>,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid)
            .bind(order.user_uuid)
            .bind(OrderStatus::Pending.as_str())
            .bind(amount_to_db(order.totals.subtotal)?)
            .bind(amount_to_db(order.totals.tax)?)
            .bind(amount_to_db(order.totals.shipping)?)
            .bind(amount_to_db(order.totals.discount)?)
            .bind(amount_to_db(order.totals.total)?)
            .bind(Json(order.shipping_address))
            .bind(Json(order.billing_address))
            .bind(order.payment_method.as_str())
            .bind(PaymentStatus::Pending.as_str())
            .bind(order.idempotency_key.map(IdempotencyKey::as_str))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Serialize checkouts sharing `(user, key)` until the transaction ends.
    pub(crate) async fn lock_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        key: &IdempotencyKey,
    ) -> Result<(), sqlx::Error> {
        query(LOCK_IDEMPOTENCY_KEY_SQL)
            .bind(user)
            .bind(key.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn find_order_by_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_IDEMPOTENCY_KEY_SQL)
            .bind(user)
            .bind(key.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        visibility: OrderVisibility,
        filter: &OrderQuery,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let (viewer, include_sold) = match visibility {
            OrderVisibility::All => (None, false),
            OrderVisibility::PlacedBy(user) => (Some(user), false),
            OrderVisibility::PlacedOrSoldBy(user) => (Some(user), true),
        };

        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(viewer)
            .bind(include_sold)
            .bind(filter.status.map(OrderStatus::as_str))
            .bind(filter.page.limit_i64())
            .bind(filter.page.offset_i64())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_order_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        write: StatusWrite,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_STATUS_SQL)
            .bind(order)
            .bind(write.status.as_str())
            .bind(write.payment_status.as_str())
            .bind(write.tracking_number)
            .bind(write.cancel_reason)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            user_uuid: row.try_get("user_uuid")?,
            status: try_get_parsed(row, "status")?,
            items: Vec::new(),
            totals: PriceBreakdown {
                subtotal: try_get_amount(row, "subtotal")?,
                tax: try_get_amount(row, "tax")?,
                shipping: try_get_amount(row, "shipping")?,
                discount: try_get_amount(row, "discount")?,
                total: try_get_amount(row, "total")?,
            },
            shipping_address: row.try_get::<Json<Address>, _>("shipping_address")?.0,
            billing_address: row.try_get::<Json<Address>, _>("billing_address")?.0,
            payment_method: try_get_parsed(row, "payment_method")?,
            payment_status: try_get_parsed(row, "payment_status")?,
            tracking_number: row.try_get("tracking_number")?,
            cancel_reason: row.try_get("cancel_reason")?,
            idempotency_key: row.try_get("idempotency_key")?,
            history: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
