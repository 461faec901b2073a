//! Reporting renderers and logging setup.
//!
//! Both renderers are plain `ReportVisitor`s over a `CorePlugin`, the same
//! contract out-of-process exporters use.

pub mod logging;
pub mod snapshot;
pub mod text;

pub use snapshot::{RegistrySnapshot, SnapshotVisitor, TimerSnapshot};
pub use text::TextReport;
