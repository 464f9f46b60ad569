use thiserror::Error;

/// Failures while loading configuration from the environment or the catalog file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Caller input rejected before any price lookup runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("city must not be empty")]
    EmptyCity,
    #[error("item at position {position} has an empty item key")]
    EmptyItemKey { position: usize },
    #[error("quantity for '{item_key}' must be a positive integer, got {quantity}")]
    NonPositiveQuantity { item_key: String, quantity: i64 },
    #[error("quantity for '{item_key}' must be at most {max}, got {quantity}")]
    QuantityTooLarge {
        item_key: String,
        quantity: i64,
        max: i64,
    },
    #[error("barcode must contain only digits, got '{0}'")]
    InvalidBarcode(String),
}

/// Errors raised by a [`crate::PriceRepository`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("price storage connection failed: {message}")]
    Connection { message: String },
    #[error("price storage query failed: {message}")]
    Query { message: String },
}

/// Error returned by the search and cart services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
