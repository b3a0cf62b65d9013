//! Append-only time-series storage for train observations.
//!
//! A single WAL-mode SQLite file holds the `train_logs` table with
//! indexes on `log_time` and `train_id`; [`TrainStore`] exposes the four
//! canonical operations (batch insert, recent window, per-train history,
//! retention prune) plus the idempotent startup migration. Rows are never
//! updated or deleted outside of [`TrainStore::prune`].

pub mod error;
mod store;


pub use error::{Result, StorageError};
pub use store::TrainStore;
