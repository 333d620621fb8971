use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Path '{path}' not found on type '{type_name}'")]
    PathNotFound { path: String, type_name: String },

    #[error("Path '{0}' ends on an object array, queries must end on a scalar-bearing field")]
    ArrayTerminalPath(String),

    #[error("Unsupported expression shape: {0}")]
    UnsupportedExpressionShape(String),

    #[error("Field '{path}' of type {type_name} has no cast mapping in {dialect}")]
    UnsupportedFieldType {
        path: String,
        type_name: String,
        dialect: String,
    },

    #[error("Operator {operator} is not supported on field '{path}'")]
    UnsupportedOperator { operator: String, path: String },

    #[error("Invalid query shape: {0}")]
    InvalidAstShape(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, MapperError>;

impl<T> From<std::sync::PoisonError<T>> for MapperError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<rusqlite::Error> for MapperError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for MapperError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::StorageError(format!("storage task failed: {}", err))
    }
}

impl From<sqlparser::parser::ParserError> for MapperError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        Self::ParseError(err.to_string())
    }
}
