//! `marketpay-recon` — Marketplace payout reconciliation engine.
//!
//! Pure engine crate: receives raw CSV buffers and pre-loaded records,
//! returns typed records, classified settlement rows and KPI totals.
//! No file IO — reading files and persisting snapshots is the caller's job.

pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod import;
pub mod kpi;
pub mod model;
pub mod parse;
pub mod payout;
pub mod reconcile;

pub use config::EngineConfig;
pub use engine::report;
pub use error::ReconError;
pub use model::{Order, ReconciledRow, Release, Report, SettlementStatus};
