use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unknown key name `{0}` in key bindings")]
    UnknownKey(String),
}

/// Reasons a joint list cannot serve as a sync index space.
#[derive(Debug, Error, PartialEq)]
pub enum SkeletonError {
    #[error("skeleton has no joints")]
    Empty,
    #[error("joint `{joint}` at index {index} has parent {parent}, which is not an earlier joint")]
    ParentOutOfOrder {
        joint: String,
        index: usize,
        parent: i32,
    },
    #[error("joint `{joint}` reports index {reported} but sits at position {index}")]
    IndexMismatch {
        joint: String,
        index: usize,
        reported: usize,
    },
    #[error("duplicate joint name `{0}`")]
    DuplicateJoint(String),
}
