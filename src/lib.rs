//! Battle view-model aggregation for a naval combat dashboard.
//!
//! `data` holds the normalized store and its joins, `battle` turns battle records into
//! per-battle summaries and per-phase attack tables, and `server`/`cli` expose them.

pub mod battle;
pub mod cli;
pub mod config;
pub mod data;
pub mod server;
pub mod telemetry;
