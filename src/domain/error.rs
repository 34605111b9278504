use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adapter phase that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterPhase {
    Hydration,
    Synthesis,
}

impl AdapterPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hydration => "hydration",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for AdapterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Similarity store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Adapter failure during {phase}: {message}")]
    Adapter { phase: AdapterPhase, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn adapter(phase: AdapterPhase, message: impl Into<String>) -> Self {
        Self::Adapter {
            phase,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Label an error raised inside an adapter call with the phase it came from.
    ///
    /// Errors that already carry a phase keep it.
    pub fn in_phase(self, phase: AdapterPhase) -> Self {
        match self {
            Self::Adapter { .. } => self,
            other => Self::adapter(phase, other.to_string()),
        }
    }

    /// The failing adapter phase, if this is an adapter failure
    pub fn phase(&self) -> Option<AdapterPhase> {
        match self {
            Self::Adapter { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
