use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON: {0}")]
    CatalogJson(#[from] serde_json::Error),

    #[error("Invalid task '{task}': {message}")]
    InvalidTask { task: String, message: String },

    #[error("Table of contents entry '{label}' refers to unknown task '{task}'")]
    UnknownTocTask { label: String, task: String },

    #[error("No task matches '{0}'")]
    TaskNotFound(String),

    #[error("'{query}' matches several tasks: {}", .candidates.join(", "))]
    AmbiguousTask {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Take parse error at line {line}: {message}")]
    TakeParse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
