use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

pub const DEFAULT_NAMESPACE: &str = "cmdbridge";
pub const DEFAULT_COMMAND_PREFIX: char = '/';

/// Settings for one registry instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Prefix for the `namespace:label` form of every registered name,
    /// normally the owning plugin's name
    pub namespace: String,
    /// Character that starts a command in raw suggestion buffers
    pub command_prefix: char,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            command_prefix: DEFAULT_COMMAND_PREFIX,
        }
    }
}

impl BridgeConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_command_prefix(mut self, prefix: char) -> Self {
        self.command_prefix = prefix;
        self
    }

    pub fn from_toml_str(content: &str) -> BridgeResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The namespace lowercased and trimmed, rejected if it cannot prefix a label
    pub fn normalized_namespace(&self) -> BridgeResult<String> {
        let namespace = self.namespace.trim().to_lowercase();
        if namespace.is_empty() || namespace.contains(':') || namespace.contains(char::is_whitespace)
        {
            return Err(BridgeError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(namespace)
    }
}
