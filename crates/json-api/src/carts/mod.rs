//! Carts

mod errors;
mod handlers;
pub(crate) mod items;
pub(crate) mod models;
mod owner;

pub(crate) use handlers::*;
