//! Pull-style metrics: values computed by the application at report time.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;

/// Produces the current value of a state probe.
pub trait StateValueProvider: Send + Sync {
    fn value(&self) -> Result<i64>;
}

struct FnProvider<F>(F);

impl<F> StateValueProvider for FnProvider<F>
where
    F: Fn() -> Result<i64> + Send + Sync,
{
    fn value(&self) -> Result<i64> {
        (self.0)()
    }
}

/// A named state probe. Nothing is stored; every read calls the provider.
#[derive(Clone)]
pub struct StateValue {
    name: String,
    provider: Arc<dyn StateValueProvider>,
}

impl StateValue {
    pub fn new(name: impl Into<String>, provider: Arc<dyn StateValueProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    /// Build a probe from a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<i64> + Send + Sync + 'static,
    {
        Self::new(name, Arc::new(FnProvider(f)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Result<i64> {
        self.provider.value()
    }

    /// Same provider under a different (escaped) name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue").field("name", &self.name).finish_non_exhaustive()
    }
}

/// One resolved leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    pub name: String,
    pub value: i64,
}

impl State {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Produces a group of leaf values in one pull.
pub trait MultiValueProvider: Send + Sync {
    fn values(&self) -> Vec<State>;
}

struct FnMultiProvider<F>(F);

impl<F> MultiValueProvider for FnMultiProvider<F>
where
    F: Fn() -> Vec<State> + Send + Sync,
{
    fn values(&self) -> Vec<State> {
        (self.0)()
    }
}

/// A named group of state leaves, pulled directly by reporting.
#[derive(Clone)]
pub struct MultiValue {
    name: String,
    provider: Arc<dyn MultiValueProvider>,
}

impl MultiValue {
    pub fn new(name: impl Into<String>, provider: Arc<dyn MultiValueProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Vec<State> + Send + Sync + 'static,
    {
        Self::new(name, Arc::new(FnMultiProvider(f)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> Vec<State> {
        self.provider.values()
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl fmt::Debug for MultiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiValue").field("name", &self.name).finish_non_exhaustive()
    }
}
