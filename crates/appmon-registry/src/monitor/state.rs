use std::sync::Arc;

use appmon_core::KeyHandler;

use crate::plugin::{CorePlugin, MonitorPlugin};

/// How the active state of a monitor came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Self-initialized with a transparent key handler.
    Default,
    /// Installed through `init_instance`.
    Explicit,
    /// Private per-thread override.
    ThreadLocal,
}

/// Immutable snapshot published by a monitor. Replaced wholesale, never
/// mutated, so readers never see a half-built plugin list.
pub(crate) struct MonitorState {
    pub(crate) core: Arc<CorePlugin>,
    pub(crate) key_handler: Arc<dyn KeyHandler>,
    pub(crate) plugins: Vec<Arc<dyn MonitorPlugin>>,
    pub(crate) mode: Mode,
}

impl MonitorState {
    pub(crate) fn new(core: Arc<CorePlugin>, key_handler: Arc<dyn KeyHandler>, mode: Mode) -> Self {
        let plugins: Vec<Arc<dyn MonitorPlugin>> = vec![Arc::clone(&core) as Arc<dyn MonitorPlugin>];
        Self {
            core,
            key_handler,
            plugins,
            mode,
        }
    }

    pub(crate) fn with_plugins(&self, plugins: Vec<Arc<dyn MonitorPlugin>>) -> Self {
        Self {
            core: Arc::clone(&self.core),
            key_handler: Arc::clone(&self.key_handler),
            plugins,
            mode: self.mode,
        }
    }

    pub(crate) fn is_core(&self, plugin: &Arc<dyn MonitorPlugin>) -> bool {
        same_plugin(plugin, &(Arc::clone(&self.core) as Arc<dyn MonitorPlugin>))
    }
}

pub(crate) fn same_plugin(a: &Arc<dyn MonitorPlugin>, b: &Arc<dyn MonitorPlugin>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
