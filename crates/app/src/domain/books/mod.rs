//! Books

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::BooksServiceError;
pub(crate) use repository::PgBooksRepository;
pub use service::*;
