//! Optimization request

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::DomainError;

/// Caller's code context: the target language and the identifiers to keep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CodeContext {
    #[validate(custom(function = "non_blank"))]
    pub language: String,
    #[serde(default)]
    pub existing_code: String,
    #[serde(default)]
    pub variable_names: Vec<String>,
    /// Local struct or class definitions the artifact should plug into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structs_or_classes: Option<String>,
}

impl CodeContext {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            existing_code: String::new(),
            variable_names: Vec::new(),
            structs_or_classes: None,
        }
    }

    pub fn with_existing_code(mut self, code: impl Into<String>) -> Self {
        self.existing_code = code.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variable_names.push(name.into());
        self
    }

    pub fn with_structs(mut self, definitions: impl Into<String>) -> Self {
        self.structs_or_classes = Some(definitions.into());
        self
    }
}

/// "Find or produce an optimized artifact for this intent, in this context"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OptimizeRequest {
    /// Caller scope for the per-organization tier
    #[validate(custom(function = "non_blank"))]
    pub org_id: String,
    /// Free-text description of what the code must do
    #[validate(custom(function = "non_blank"))]
    pub intent: String,
    #[validate(nested)]
    pub context: CodeContext,
}

impl OptimizeRequest {
    pub fn new(org_id: impl Into<String>, intent: impl Into<String>, context: CodeContext) -> Self {
        Self {
            org_id: org_id.into(),
            intent: intent.into(),
            context,
        }
    }

    /// Validate and map failures to a domain error
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate().map_err(validation_error)
    }
}

pub(crate) fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Flatten validator errors into one message listing every offending field
pub(crate) fn validation_error(errors: ValidationErrors) -> DomainError {
    let mut fields = Vec::new();
    collect_fields("", &errors, &mut fields);
    fields.sort();

    DomainError::validation(format!("Invalid request: {}", fields.join(", ")))
}

fn collect_fields(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            validator::ValidationErrorsKind::Field(errs) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string());
                out.push(format!("{} {}", path, message));
            }
            validator::ValidationErrorsKind::Struct(inner) => {
                collect_fields(&path, inner, out);
            }
            validator::ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_fields(&format!("{}[{}]", path, idx), inner, out);
                }
            }
        }
    }
}
