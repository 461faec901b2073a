//! Per-thread state overrides, keyed by monitor id.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use super::state::MonitorState;

thread_local! {
    static OVERRIDES: RefCell<HashMap<u64, Arc<MonitorState>>> = RefCell::new(HashMap::new());
}

pub(crate) fn get(monitor_id: u64) -> Option<Arc<MonitorState>> {
    OVERRIDES
        .try_with(|o| o.borrow().get(&monitor_id).cloned())
        .ok()
        .flatten()
}

pub(crate) fn set(monitor_id: u64, state: Arc<MonitorState>) -> Option<Arc<MonitorState>> {
    OVERRIDES
        .try_with(|o| o.borrow_mut().insert(monitor_id, state))
        .ok()
        .flatten()
}

pub(crate) fn clear(monitor_id: u64) -> Option<Arc<MonitorState>> {
    OVERRIDES
        .try_with(|o| o.borrow_mut().remove(&monitor_id))
        .ok()
        .flatten()
}
