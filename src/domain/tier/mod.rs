//! Knowledge tiers
//!
//! A tier is data: where it lives, how it accepts candidates and what form
//! of artifact it holds. The orchestrator walks a list of them.

mod definition;
mod probe;

pub use definition::{AcceptancePolicy, ArtifactForm, NamespaceScope, TierDefinition};
pub use probe::{probe_tier, satisfies_match_fields, MatchValues, ProbeOutcome};
