//! Order Status History Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::try_get_parsed,
    domain::{
        orders::records::{OrderStatus, OrderUuid, StatusChangeRecord, StatusChangeUuid},
        users::records::UserUuid,
    },
};

const CREATE_STATUS_CHANGE_SQL: &str = include_str!("../sql/create_status_change.sql");
const GET_STATUS_HISTORY_SQL: &str = include_str!("../sql/get_status_history.sql");

/// A history entry tagged with the order it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct StatusChangeRow {
    pub order_uuid: OrderUuid,
    pub change: StatusChangeRecord,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderHistoryRepository;

impl PgOrderHistoryRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn record_status_change(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
        note: Option<&str>,
        changed_by: Option<UserUuid>,
    ) -> Result<StatusChangeRecord, sqlx::Error> {
        query_as::<Postgres, StatusChangeRow>(CREATE_STATUS_CHANGE_SQL)
            .bind(StatusChangeUuid::new())
            .bind(order)
            .bind(status.as_str())
            .bind(note)
            .bind(changed_by)
            .fetch_one(&mut **tx)
            .await
            .map(|row| row.change)
    }

    pub(crate) async fn get_status_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<StatusChangeRow>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().copied().map(OrderUuid::into_uuid).collect();

        query_as::<Postgres, StatusChangeRow>(GET_STATUS_HISTORY_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for StatusChangeRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order_uuid: row.try_get("order_uuid")?,
            change: StatusChangeRecord {
                uuid: row.try_get("uuid")?,
                status: try_get_parsed(row, "status")?,
                note: row.try_get("note")?,
                changed_by: row.try_get("changed_by")?,
                created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            },
        })
    }
}
