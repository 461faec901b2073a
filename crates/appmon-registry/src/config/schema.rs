use std::sync::Arc;

use serde::Deserialize;

use appmon_core::error::{MonitorError, Result};
use appmon_core::metric::DEFAULT_MAX_ENTRIES;
use appmon_core::{
    EscapingKeyHandler, KeyHandler, RegexKeyHandler, TransparentKeyHandler, ValidatingKeyHandler,
};

use crate::plugin::CoreSettings;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    pub version: u32,

    #[serde(default)]
    pub monitor: MonitorSection,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MonitorError::UnsupportedVersion);
        }
        self.monitor.validate()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub key_handler: KeyHandlerConfig,

    #[serde(default = "default_historizable_max_entries")]
    pub historizable_max_entries: usize,

    #[serde(default = "default_true")]
    pub builtin_state_values: bool,

    #[serde(default)]
    pub unique_name: Option<String>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            active: true,
            key_handler: KeyHandlerConfig::default(),
            historizable_max_entries: default_historizable_max_entries(),
            builtin_state_values: true,
            unique_name: None,
        }
    }
}

impl MonitorSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.historizable_max_entries) {
            return Err(MonitorError::BadConfig(
                "monitor.historizable_max_entries must be between 1 and 1000".into(),
            ));
        }
        if matches!(self.unique_name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(MonitorError::BadConfig(
                "monitor.unique_name must not be blank".into(),
            ));
        }
        self.key_handler.validate()
    }

    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            exposition: None,
            historizable_max_entries: self.historizable_max_entries,
            builtin_state_values: self.builtin_state_values,
            unique_name: self.unique_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyHandlerKind {
    #[default]
    Transparent,
    Escaping,
    Validating,
    Regex,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyHandlerConfig {
    #[serde(default)]
    pub kind: KeyHandlerKind,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default = "default_replacement")]
    pub replacement: String,
}

impl Default for KeyHandlerConfig {
    fn default() -> Self {
        Self {
            kind: KeyHandlerKind::default(),
            pattern: None,
            replacement: default_replacement(),
        }
    }
}

impl KeyHandlerConfig {
    pub fn validate(&self) -> Result<()> {
        match (self.kind, &self.pattern) {
            (KeyHandlerKind::Regex, None) => Err(MonitorError::BadConfig(
                "monitor.key_handler.pattern is required for kind regex".into(),
            )),
            (KeyHandlerKind::Regex, Some(_)) => self.build().map(|_| ()),
            (_, Some(_)) => Err(MonitorError::BadConfig(
                "monitor.key_handler.pattern is only allowed for kind regex".into(),
            )),
            (_, None) => Ok(()),
        }
    }

    pub fn build(&self) -> Result<Arc<dyn KeyHandler>> {
        let handler: Arc<dyn KeyHandler> = match self.kind {
            KeyHandlerKind::Transparent => Arc::new(TransparentKeyHandler),
            KeyHandlerKind::Escaping => Arc::new(EscapingKeyHandler),
            KeyHandlerKind::Validating => Arc::new(ValidatingKeyHandler),
            KeyHandlerKind::Regex => {
                let pattern = self.pattern.as_deref().ok_or_else(|| {
                    MonitorError::BadConfig("monitor.key_handler.pattern is required for kind regex".into())
                })?;
                Arc::new(RegexKeyHandler::new(pattern, self.replacement.clone())?)
            }
        };
        Ok(handler)
    }
}

fn default_true() -> bool {
    true
}
fn default_historizable_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}
fn default_replacement() -> String {
    "_".into()
}
