///
/// Tool error types.
///
/// Failures of the host itself: unreadable or malformed configuration,
/// malformed script lines, and I/O on the script or output streams.
/// Bridge failures never surface here; they are printed as result lines.
///

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to read config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Script line {line}: {reason}")]
    Script { line: usize, reason: String },

    #[error("Async invocation task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ToolError::Config {
            path: PathBuf::from("/etc/sqlbridge.toml"),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/etc/sqlbridge.toml"));
        assert!(err.to_string().contains("permission denied"));

        let err = ToolError::Script {
            line: 4,
            reason: "missing field `method`".to_string(),
        };
        assert!(err.to_string().contains("line 4"));
        assert!(err.to_string().contains("missing field"));
    }
}
