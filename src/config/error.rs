// Errors raised while loading or validating opponent profiles

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse TOML profile: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON profile: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid profile field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },

    #[error("unknown profile preset `{0}`")]
    UnknownPreset(String),
}

impl ProfileError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        ProfileError::Invalid { field, reason }
    }
}
