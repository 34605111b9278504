//! Stored artifacts

use serde::{Deserialize, Serialize};

use crate::domain::tier::ArtifactForm;

/// Language of context-free artifacts
pub const PURE_LANGUAGE: &str = "C++";

/// An optimized implementation, as stored in a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub optimized_code: String,
    pub language: String,
    pub time_complexity: String,
    pub form: ArtifactForm,
}

impl Artifact {
    /// A context-free artifact in the canonical language
    pub fn pure(code: impl Into<String>, time_complexity: impl Into<String>) -> Self {
        Self {
            optimized_code: code.into(),
            language: PURE_LANGUAGE.to_string(),
            time_complexity: time_complexity.into(),
            form: ArtifactForm::Pure,
        }
    }

    /// Specialize this artifact with hydrated code for a language
    pub fn hydrated(&self, code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            optimized_code: code.into(),
            language: language.into(),
            time_complexity: self.time_complexity.clone(),
            form: ArtifactForm::Hydrated,
        }
    }

    pub fn is_pure(&self) -> bool {
        self.form == ArtifactForm::Pure
    }
}

/// Output of the synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedArtifact {
    pub code: String,
    pub time_complexity: String,
}

impl SynthesizedArtifact {
    pub fn new(code: impl Into<String>, time_complexity: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            time_complexity: time_complexity.into(),
        }
    }

    pub fn into_artifact(self) -> Artifact {
        Artifact::pure(self.code, self.time_complexity)
    }
}
