/// Immutable name/value pair, e.g. a build or schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    name: String,
    value: String,
}

impl Version {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Same value under a different (escaped) name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: self.value.clone(),
        }
    }
}
