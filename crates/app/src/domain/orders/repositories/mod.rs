//! Order Repositories

mod history;
mod items;
mod orders;

pub(crate) use history::PgOrderHistoryRepository;
pub(crate) use items::{NewOrderItem, PgOrderItemsRepository};
pub(crate) use orders::{NewOrderRow, OrderVisibility, PgOrdersRepository, StatusWrite};
