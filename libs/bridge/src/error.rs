//! Bridge error types
//!
//! Registration outcomes are reported as booleans; these errors cover setup
//! mistakes that a host should surface at startup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Command labels must be a single non-empty word
    #[error("Invalid command label '{0}': labels must be non-empty and contain no whitespace")]
    InvalidLabel(String),

    /// Namespaces prefix labels as `namespace:label`, so they cannot contain `:`
    #[error("Invalid namespace '{0}': namespaces must be non-empty and contain no ':' or whitespace")]
    InvalidNamespace(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),
}

/// Result type alias for bridge setup
pub type BridgeResult<T> = Result<T, BridgeError>;
