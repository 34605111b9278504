//! API request and response types

pub mod error;
pub mod guidance;
pub mod json;

pub use error::{ApiError, ApiErrorResponse};
pub use guidance::{
    EnhancePromptBody, EnhancePromptResponse, IngestRuleResponse, RetrieveRulesBody,
    RetrieveRulesResponse, RulesListResponse, RulesQuery,
};
pub use json::Json;
