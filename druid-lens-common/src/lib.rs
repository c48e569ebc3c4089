pub mod config;
pub use config::{Config, HistogramConfig, SourceConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DruidLensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Invalid bin geometry: {0}")]
    InvalidBinGeometry(String),
    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DruidLensError>;
