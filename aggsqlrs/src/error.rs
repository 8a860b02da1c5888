use thiserror::Error;

use crate::aggregate::Shape;
use crate::dialect::DatabaseType;

pub type Result<T> = std::result::Result<T, AggsqlError>;

#[derive(Debug, Error)]
pub enum AggsqlError {
    #[error("{shape} shape requires {field} to be non-null")]
    MissingSelect { shape: Shape, field: &'static str },
    #[error("invalid aggregate request: {0}")]
    InvalidRequest(String),
    #[error("unsupported axis increment '{0}' (expected day, month, quarter or year)")]
    UnsupportedIncrement(String),
    #[error("cannot determine a column name for '{0}': add an explicit alias (AS name)")]
    AmbiguousAlias(String),
    #[error("invalid TopX line '{0}': expected a positive row count")]
    InvalidTopX(String),
    #[error("{dialect} cannot synthesize the {shape} shape: no dynamic SQL execution")]
    UnsupportedShape { dialect: DatabaseType, shape: Shape },
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
