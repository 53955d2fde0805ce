//! Book Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod stock;
pub(crate) mod update;

/// Longest accepted title.
pub(crate) const MAX_TITLE_LEN: usize = 200;

/// Longest accepted author name.
pub(crate) const MAX_AUTHOR_LEN: usize = 120;

pub(crate) const MAX_DESCRIPTION_LEN: usize = 5_000;

/// Highest accepted price, in cents.
pub(crate) const MAX_PRICE: u64 = 100_000_000;

pub(crate) const MAX_STOCK: u32 = 1_000_000;
