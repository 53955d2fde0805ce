//! Order Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_to_db, count_to_db, try_get_amount, try_get_count},
    domain::{
        books::records::BookUuid,
        orders::records::{OrderItemRecord, OrderItemUuid, OrderUuid},
        users::records::UserUuid,
    },
};

const CREATE_ORDER_ITEM_SQL: &str = include_str!("../sql/create_order_item.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("../sql/get_order_items.sql");

/// Order line snapshot to insert.
#[derive(Debug, Clone)]
pub(crate) struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub book_uuid: BookUuid,
    pub seller_uuid: UserUuid,
    pub title: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_total: u64,
}

/// An order line tagged with the order it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct OrderItemRow {
    pub order_uuid: OrderUuid,
    pub item: OrderItemRecord,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        position: u32,
        item: NewOrderItem,
    ) -> Result<OrderItemRecord, sqlx::Error> {
        query_as::<Postgres, OrderItemRow>(CREATE_ORDER_ITEM_SQL)
            .bind(item.uuid)
            .bind(order)
            .bind(item.book_uuid)
            .bind(item.seller_uuid)
            .bind(item.title)
            .bind(count_to_db(item.quantity)?)
            .bind(amount_to_db(item.unit_price)?)
            .bind(amount_to_db(item.line_total)?)
            .bind(count_to_db(position)?)
            .fetch_one(&mut **tx)
            .await
            .map(|row| row.item)
    }

    pub(crate) async fn get_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderItemRow>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().copied().map(OrderUuid::into_uuid).collect();

        query_as::<Postgres, OrderItemRow>(GET_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order_uuid: row.try_get("order_uuid")?,
            item: OrderItemRecord {
                uuid: row.try_get("uuid")?,
                book_uuid: row.try_get("book_uuid")?,
                seller_uuid: row.try_get("seller_uuid")?,
                title: row.try_get("title")?,
                quantity: try_get_count(row, "quantity")?,
                unit_price: try_get_amount(row, "unit_price")?,
                line_total: try_get_amount(row, "line_total")?,
            },
        })
    }
}
