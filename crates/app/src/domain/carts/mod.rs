//! Carts

pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod rules;
pub mod service;

pub use errors::CartsServiceError;
pub(crate) use repositories::{PgCartItemsRepository, PgCartsRepository};
pub use service::*;
