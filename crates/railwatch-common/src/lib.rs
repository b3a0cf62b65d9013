//! Shared domain types for the railwatch watchdog.
//!
//! Everything that crosses a crate boundary lives here: the normalized
//! [`types::TrainRecord`] observation, the [`types::Severity`] scale used
//! by the alert tracker, and the derived report/alert payloads.

pub mod types;
