//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod guidance;
pub mod llm;
pub mod logging;
pub mod optimization;
pub mod services;
pub mod store;
