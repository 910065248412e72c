//! Core error types for Tilelevel

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Level error: {0}")]
    Level(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
