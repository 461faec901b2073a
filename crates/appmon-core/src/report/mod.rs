//! Reporting contracts.
//!
//! - Push: a [`ReportableObserver`] is told about every metric that exists in
//!   the registry it watches, past and future.
//! - Pull: a [`ReportVisitor`] walks a full registry dump.
//!
//! Both sides see metrics as a [`Reportable`], a closed set of metric kinds.

mod observer;
mod reportable;
mod visitor;

pub use observer::ReportableObserver;
pub use reportable::{AsReportable, Reportable};
pub use visitor::ReportVisitor;
