use std::path::PathBuf;

use thiserror::Error;

/// Why a single file could not be rewritten.
///
/// These never abort a run: the walker records them against the file and moves on.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf },
    #[error("{} is not below the source root {}", path.display(), root.display())]
    OutsideSourceRoot { path: PathBuf, root: PathBuf },
    #[error("cannot compute an import path for {}", path.display())]
    UnsupportedPath { path: PathBuf },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
