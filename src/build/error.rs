//! Per-document build failures

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::content::{ParseError, RenderConsistencyError, TemplateError, ValidationError};

/// Step of the pipeline that ran on the blocking pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    ImageProbe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Render => f.write_str("rendering"),
            Stage::ImageProbe => f.write_str("image probing"),
        }
    }
}

/// Why a single document could not be built
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("markdown renderer failed: {0:#}")]
    Render(anyhow::Error),

    #[error(transparent)]
    RenderConsistency(#[from] RenderConsistencyError),

    #[error("{stage} timed out after {timeout:?}")]
    Timeout { stage: Stage, timeout: Duration },

    #[error("failed to serialize post: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write artifact {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
