//! appmon registry: the concurrent metric registry and reporting engine.
//!
//! This crate wires the per-category registries, the built-in `CorePlugin`
//! with its sync protocol, and the `InApplicationMonitor` access point into
//! one stack. Exporters plug in through `MonitorPlugin`, `ReportableObserver`
//! and `ReportVisitor`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod monitor;
pub mod obs;
pub mod plugin;
pub mod registry;
pub mod testing;

pub use monitor::{InApplicationMonitor, Mode, TimerGuard};
pub use plugin::{CorePlugin, CoreSettings, Exposition, MonitorPlugin};
pub use registry::{Monitors, ObserverList};
