//! Error types for the chapter pipeline.
//!
//! The library reports every failure through [`PipelineError`]; the binary
//! wraps it with `anyhow` context. Nothing here is retried.

use std::path::PathBuf;

/// Every way a pipeline run can stop.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Network or connection failure talking to the model endpoint or page host.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered with a non-success HTTP status.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The model response did not carry `choices[0].message.content`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The scoring stage returned no numeric token.
    #[error("no numeric score found in scorer output: {response}")]
    ScoreParse { response: String },

    /// Page navigation exceeded its wait budget.
    #[error("fetch of {url} timed out after {seconds}s")]
    FetchTimeout { url: String, seconds: u64 },

    /// An archive with the same timestamp already exists.
    #[error("version collision: {path:?} already exists")]
    VersionCollision { path: PathBuf },

    /// Caller-supplied input was rejected before any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing or unusable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Wrap a `std::io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::ScoreParse {
            response: "Pretty good!".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no numeric score found in scorer output: Pretty good!"
        );

        let err = PipelineError::Api {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert!(err.to_string().contains("401"));
    }
}
