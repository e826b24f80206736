//! daybook-core: synthesizes a plausible day of transactions that sum
//! to a target total, following the amount/frequency pattern of
//! user-authored templates.
//!
//! The amount distribution engine ([`engine`]) is pure computation over
//! plain values. Templates and reports live in the SQLite [`store`];
//! [`report::ReportService`] wires the two together.

pub mod config;
pub mod decompose;
pub mod engine;
pub mod error;
pub mod order;
pub mod pattern;
pub mod payment;
pub mod progress;
pub mod report;
pub mod rng;
pub mod rounding;
pub mod schedule;
pub mod selector;
pub mod store;
pub mod template;
pub mod types;
pub mod variance;
