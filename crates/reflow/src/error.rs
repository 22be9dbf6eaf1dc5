//! The single failure type of a conversion.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Pipeline stage at which a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Opening or validating the input, or loading options.
    Input,
    Extraction,
    Reconciliation,
    Render,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Extraction => "extraction",
            Stage::Reconciliation => "reconciliation",
            Stage::Render => "render",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// A fatal conversion error tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct ConvertError {
    pub stage: Stage,
    pub source: Box<dyn StdError + Send + Sync>,
}

impl ConvertError {
    pub fn new(stage: Stage, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// Tag the error of a fallible step with its stage.
pub(crate) trait StageExt<T> {
    fn at(self, stage: Stage) -> Result<T, ConvertError>;
}

impl<T, E> StageExt<T> for Result<T, E>
where
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn at(self, stage: Stage) -> Result<T, ConvertError> {
        self.map_err(|e| ConvertError::new(stage, e))
    }
}
