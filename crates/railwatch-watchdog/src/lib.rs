//! Watchdog daemon wiring: configuration, the tick scheduler, and the
//! read-only query handle external collaborators use.

pub mod config;
pub mod scheduler;
pub mod state;
