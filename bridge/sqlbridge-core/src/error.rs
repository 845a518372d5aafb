///
/// Bridge error types.
///
/// Every failure that can cross the host boundary: caller input errors
/// (empty SQL, malformed parameters), the missing-connection precondition,
/// engine failures, and I/O while preparing a database file.
///

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{context} failed, sql is empty")]
    EmptySql { context: &'static str },

    #[error("no open database connection")]
    NoConnection,

    #[error("database path is empty")]
    EmptyPath,

    #[error("{0}")]
    Engine(String),

    #[error("execute sql : {sql} failed: {reason}")]
    Statement { sql: String, reason: String },

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
