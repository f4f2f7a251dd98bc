//! Engine error types
//!
//! Only failures the engine itself cannot recover from are `Result` errors.
//! Rule failures are folded into `TransformResult` by the factories and never
//! show up here.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Per-path filesystem failure.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} does not exist")]
    NotFound(PathBuf),
}

/// Failure of an external post-processing tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("`{program}` timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot read source directory: {0}")]
    SourceDirectory(#[source] FsError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_paths() {
        let err = PipelineError::SourceDirectory(FsError::NotFound(PathBuf::from("src/ui")));
        assert_eq!(
            err.to_string(),
            "cannot read source directory: src/ui does not exist"
        );
    }

    #[test]
    fn test_tool_timeout_message() {
        let err = ToolError::Timeout {
            program: "prettier".to_string(),
            timeout: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "`prettier` timed out after 2s");
    }
}
