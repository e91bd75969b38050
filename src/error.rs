use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid invoice JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse {}: {source}", .path.display())]
    TomlRead {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write settings: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("No home or config directory could be determined")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, Error>;
