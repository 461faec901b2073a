//! Top-level facade crate for appmon.
//!
//! Re-exports core types and the registry library so users can depend on a single crate.

pub mod core {
    pub use appmon_core::*;
}

pub mod registry {
    pub use appmon_registry::*;
}

pub use appmon_core::metric;
pub use appmon_core::{KeyHandler, MonitorError, ReportVisitor, Reportable, ReportableObserver, Result};
pub use appmon_registry::{CorePlugin, InApplicationMonitor, MonitorPlugin};
