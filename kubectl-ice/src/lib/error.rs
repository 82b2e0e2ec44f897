use thiserror::Error;

/// Main error type for the ice plugin
#[derive(Error, Debug)]
pub enum IceError {
    /// Kubernetes API errors
    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] KubernetesError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Table errors
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Kubernetes-specific errors
#[derive(Error, Debug)]
pub enum KubernetesError {
    /// API server connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Named pod not found
    #[error("pods \"{0}\" not found")]
    ResourceNotFound(String),

    /// Query matched nothing
    #[error("No resources found{0}")]
    NoResources(String),

    /// API error
    #[error("API error: {0}")]
    ApiError(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Options that may not be combined
    #[error("{0} and {1} cannot be used together")]
    Conflict(String, String),

    /// Invalid configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Malformed filter or selector expression
    #[error("Invalid expression \"{0}\": {1}")]
    InvalidExpression(String, String),

    /// Configuration file error
    #[error("File error: {0}")]
    FileError(String),
}

/// Errors raised while shaping a table
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    /// A sort or filter named a column that does not exist
    #[error("unknown column \"{0}\"")]
    UnknownColumn(String),

    /// A filter expression could not be parsed
    #[error("unable to parse filter \"{0}\"")]
    InvalidFilter(String),
}

/// Helper type alias for Results
pub type Result<T> = std::result::Result<T, IceError>;
