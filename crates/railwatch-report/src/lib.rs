//! Incident reporting: 7-day "receipt" aggregation and the draft text
//! regenerated every tick.
//!
//! Both halves are deterministic functions of store contents and the
//! clock; no state lives here.

pub mod draft;
pub mod receipt;

pub use draft::{build_incidents, render_draft, IncidentLine};
pub use receipt::ReceiptAnalyzer;
