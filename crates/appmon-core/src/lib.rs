//! appmon core: metric value types, key handlers, reporting contracts and the
//! shared error type.
//!
//! This crate holds everything an exporter needs to consume metrics without
//! depending on the registry itself: the leaf metric types, the `Reportable`
//! sum type and the observer/visitor traits.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Metric calls sit on application hot paths; failures surface as
//! `MonitorError`/`Result` instead of taking the host process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod key;
pub mod metric;
pub mod report;

/// Shared result type.
pub use error::{ErrorCode, MonitorError, Result};
pub use key::{EscapingKeyHandler, KeyHandler, RegexKeyHandler, TransparentKeyHandler, ValidatingKeyHandler};
pub use report::{AsReportable, ReportVisitor, Reportable, ReportableObserver};
