//! Generative adapters used on cache misses

use std::fmt::Debug;

use async_trait::async_trait;

use super::artifact::{Artifact, SynthesizedArtifact};
use super::request::{CodeContext, OptimizeRequest};
use crate::domain::DomainError;

/// Specializes a context-free artifact to a caller's language and context
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Hydrator: Send + Sync + Debug {
    /// Return the code of the specialized artifact
    async fn hydrate(&self, artifact: &Artifact, context: &CodeContext)
        -> Result<String, DomainError>;
}

/// Produces a new context-free artifact from scratch
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Synthesizer: Send + Sync + Debug {
    async fn synthesize(&self, request: &OptimizeRequest)
        -> Result<SynthesizedArtifact, DomainError>;
}
