//! Code optimization: tiered lookup with synthesis on a full miss

mod adapter;
mod artifact;
mod orchestrator;
mod request;
mod response;
mod single_flight;

pub use adapter::{Hydrator, Synthesizer};
pub use artifact::{Artifact, SynthesizedArtifact, PURE_LANGUAGE};
pub use orchestrator::{standard_tiers, TieredCacheOrchestrator, LANGUAGE_FIELD};
pub use request::{CodeContext, OptimizeRequest};
pub use response::{OptimizeResponse, ResolutionMetrics};
pub use single_flight::{FlightGuard, SingleFlight};

pub(crate) use request::{non_blank, validation_error};

#[cfg(test)]
pub use adapter::{MockHydrator, MockSynthesizer};
