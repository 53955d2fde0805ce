//! Stock reconciliation.
//!
//! Every write to a book's `stock` or `sales_count` goes through
//! [`PgStockReconciler`], which keeps `status` in lockstep with stock.

mod level;
mod reconciler;

pub use level::*;
pub use reconciler::ReconcileError;
pub(crate) use reconciler::PgStockReconciler;
