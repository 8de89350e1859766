use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not write TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("invoice not found: {0}")]
    NotFound(String),

    #[error("invalid invoice id: {0:?}")]
    InvalidId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
