use serde::{Deserialize, Serialize};

/// A failed validation rule, keyed by the property expression it checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub property: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Outcome of processing one command message.
///
/// Successful when no validation error was recorded; the handler's output is then
/// available through `result()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult<R> {
    errors: Vec<ValidationError>,
    result: Option<R>,
}

impl<R> ExecutionResult<R> {
    pub fn succeeded(result: R) -> Self {
        Self {
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failed(errors: Vec<ValidationError>) -> Self {
        Self {
            errors,
            result: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Messages recorded against one property expression, in rule order.
    pub fn errors_for<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.property == property)
            .map(|e| e.message.as_str())
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Result<R, Vec<ValidationError>> {
        match self.result {
            Some(result) if self.errors.is_empty() => Ok(result),
            _ => Err(self.errors),
        }
    }
}
