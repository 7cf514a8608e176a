//! Client-side validation of task fields.
//!
//! Results are advisory: the server may re-validate. They exist so that a
//! caller can skip a request that would certainly be rejected. Failures are
//! returned as data, never as `Err`.

use crate::types::CreateTaskRequest;

/// Outcome of validating one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Length bounds applied to trimmed fields, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub title_min: usize,
    pub title_max: usize,
    pub description_min: usize,
    pub description_max: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            title_min: 3,
            title_max: 100,
            description_min: 5,
            description_max: 500,
        }
    }
}

/// Stateless validator for task input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskValidator {
    rules: ValidationRules,
}

impl TaskValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> ValidationRules {
        self.rules
    }

    /// A title is required and must fit within the title bounds.
    pub fn validate_title(&self, title: &str) -> ValidationResult {
        let len = title.trim().chars().count();
        let mut errors = Vec::new();

        if len == 0 {
            errors.push("Title is required".to_string());
        } else if len < self.rules.title_min {
            errors.push(format!(
                "Title must be at least {} characters",
                self.rules.title_min
            ));
        } else if len > self.rules.title_max {
            errors.push(format!(
                "Title cannot exceed {} characters",
                self.rules.title_max
            ));
        }

        ValidationResult::from_errors(errors)
    }

    /// A description is optional; a non-blank one must fit within the
    /// description bounds.
    pub fn validate_description(&self, description: &str) -> ValidationResult {
        let len = description.trim().chars().count();
        let mut errors = Vec::new();

        if len > 0 {
            if len < self.rules.description_min {
                errors.push(format!(
                    "Description must be at least {} characters",
                    self.rules.description_min
                ));
            } else if len > self.rules.description_max {
                errors.push(format!(
                    "Description cannot exceed {} characters",
                    self.rules.description_max
                ));
            }
        }

        ValidationResult::from_errors(errors)
    }

    /// Title errors first, then description errors.
    pub fn validate_task(&self, request: &CreateTaskRequest) -> ValidationResult {
        let mut errors = self.validate_title(&request.title).errors;
        errors.extend(self.validate_description(&request.description).errors);
        ValidationResult::from_errors(errors)
    }
}
