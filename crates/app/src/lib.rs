//! Bookstore domain: catalog, stock, pricing, carts, orders and reviews,
//! persisted in PostgreSQL.
//!
//! Services are exposed as traits so the HTTP layer can swap in mocks.

pub mod auth;
pub mod context;
pub mod database;
pub mod domain;

mod uuids;

#[cfg(test)]
mod test;
