/// Error types for the edges of the game: config files, level files and
/// the prefab registry. The simulation core itself never fails a tick.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entity::PropKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level `{name}` has no rows")]
    Empty { name: String },
    #[error("level `{name}` has no player spawn (`P`)")]
    NoSpawn { name: String },
    #[error("could not read level {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    #[error("no prefab registered for {0:?}")]
    MissingPrefab(PropKind),
}
