//! Order Handlers

pub(crate) mod cancel;
pub(crate) mod create;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod status;

/// Longest accepted free-text note or reason.
pub(crate) const MAX_NOTE_LEN: usize = 500;
