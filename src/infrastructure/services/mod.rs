//! Infrastructure services

mod guidance_service;

pub use guidance_service::{EnhancePromptRequest, EnhancedPrompt, GuidanceService, SeedSummary};
