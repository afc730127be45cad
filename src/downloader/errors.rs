// Error types for the download session

use thiserror::Error;

use super::diagnostics::{diagnose_error, BlockingReason};

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// yt-dlp or ffmpeg not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The resolver could not turn the URL into downloadable content
    #[error("{reason}: {message}")]
    Resolution {
        reason: BlockingReason,
        message: String,
    },

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem or terminal I/O failed
    #[error("IO error: {0}")]
    Io(String),

    /// Rejected user input or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DownloadError {
    /// Resolution failure classified from resolver output
    pub fn resolution(message: impl Into<String>) -> Self {
        let message = message.into();
        let reason = diagnose_error(&message).unwrap_or(BlockingReason::Unknown);
        Self::Resolution { reason, message }
    }

    pub fn no_content() -> Self {
        Self::Resolution {
            reason: BlockingReason::NoContent,
            message: "The content may be private or deleted.".to_string(),
        }
    }

    /// Map error to a process exit code (sysexits.h where one fits)
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Resolution { .. } => 1,
            Self::InvalidInput(_) => 2,   // EX_USAGE
            Self::ParseError(_) => 65,    // EX_DATAERR
            Self::ToolNotFound(_) => 69,  // EX_UNAVAILABLE
            Self::ExecutionError(_) => 71, // EX_OSERR
            Self::Io(_) => 74,            // EX_IOERR
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for DownloadError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e.to_string())
    }
}

// Raw stderr from the resolver
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("command not found") || lower.contains("no such file or directory") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid json") || lower.contains("expected value") {
            return Self::ParseError(s);
        }

        if lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::InvalidInput(s);
        }

        Self::resolution(s)
    }
}
