//! Generic metric registry and its observer list.
//!
//! One `Monitors<T>` per metric category, all sharing the owning plugin's
//! `ObserverList`. Creating a counter never contends with creating a timer.

mod monitors;
mod observers;

pub use monitors::Monitors;
pub use observers::ObserverList;
