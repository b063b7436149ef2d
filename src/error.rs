use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::config::Config`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A single value failed validation.
    #[error("Invalid configuration value at {key}: {message}")]
    Invalid { key: String, message: String },

    /// Exactly one of the store URL and key is set.
    #[error("FIXHIVE_SUPABASE_URL and FIXHIVE_SUPABASE_KEY must both be set or both be unset")]
    AsymmetricRemote,
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failures talking to the remote knowledge base.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("knowledge base returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// One argument that failed its contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Argument name, e.g. `"limit"`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Tool arguments that failed the operation's schema.
///
/// Carries every offending field, not just the first.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Names of the offending fields, in the order they were checked.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid arguments: ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = ValidationError {
            fields: vec![
                FieldError::new("error_message", "is required"),
                FieldError::new("limit", "must be between 1 and 20"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments: error_message: is required; limit: must be between 1 and 20"
        );
        assert_eq!(err.field_names(), vec!["error_message", "limit"]);
    }
}
