//! Release label assignment

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::error::{ConfigError, HookError, Result};

/// How the release label for a run is obtained
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReleaseInput {
    /// Use this name verbatim
    Explicit(String),
    /// Ask the configured generator for a name
    AutoGenerate,
    /// Leave the changelog unlabeled
    #[default]
    Absent,
}

impl ReleaseInput {
    /// Map the `--release [NAME]` flag onto an input
    pub fn from_flag(flag: Option<Option<String>>) -> Self {
        match flag {
            None => Self::Absent,
            Some(None) => Self::AutoGenerate,
            Some(Some(name)) if name.trim().is_empty() => Self::AutoGenerate,
            Some(Some(name)) => Self::Explicit(name),
        }
    }
}

/// Produces a release name on demand
#[async_trait]
pub trait ReleaseNameGenerator: Send + Sync {
    /// Generate the release name
    async fn generate(&self) -> Result<String>;
}

/// Decides the release label for a run
pub struct ReleaseAssigner {
    generator: Option<Arc<dyn ReleaseNameGenerator>>,
}

impl ReleaseAssigner {
    /// Create an assigner with an optional generator
    pub fn new(generator: Option<Arc<dyn ReleaseNameGenerator>>) -> Self {
        Self { generator }
    }

    /// Check that `input` can be satisfied without doing any work
    pub fn validate(&self, input: &ReleaseInput) -> Result<()> {
        if *input == ReleaseInput::AutoGenerate && self.generator.is_none() {
            return Err(ConfigError::MissingReleaseGenerator.into());
        }
        Ok(())
    }

    /// Assign the release label. Consumes the assigner, so the generator
    /// runs at most once per run.
    #[instrument(skip(self))]
    pub async fn assign(self, input: &ReleaseInput) -> Result<Option<String>> {
        self.validate(input)?;

        match input {
            ReleaseInput::Explicit(name) => {
                info!(release = %name, "using explicit release name");
                Ok(Some(name.clone()))
            }
            ReleaseInput::Absent => {
                debug!("no release requested");
                Ok(None)
            }
            ReleaseInput::AutoGenerate => {
                let Some(generator) = self.generator else {
                    return Err(ConfigError::MissingReleaseGenerator.into());
                };
                let name = generator.generate().await?;
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(HookError::EmptyOutput {
                        name: "release.generator".to_string(),
                    }
                    .into());
                }
                info!(release = %name, "generated release name");
                Ok(Some(name))
            }
        }
    }
}
