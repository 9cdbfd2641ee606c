use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to read {path}: {details}")]
    ReadSource { path: PathBuf, details: String },

    #[error("Failed to parse {path}: {details}")]
    ParseSource { path: PathBuf, details: String },

    #[error("No route info for '{0}'")]
    UnknownRoute(String),

    #[error("Unhandled field type on {type_name}.{field}: {details}")]
    UnhandledFieldType {
        type_name: String,
        field: String,
        details: String,
    },

    #[error("Invalid generator config: {0}")]
    Config(String),
}
