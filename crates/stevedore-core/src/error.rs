//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid bundle stream: {0}")]
    Stream(#[source] serde_yaml::Error),

    #[error("Failed to normalize document {index}: {source}")]
    Normalize {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Malformed declaration {index}: {message}")]
    MalformedDeclaration { index: usize, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Failed to parse configuration: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
