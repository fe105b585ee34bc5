//! Declarative validation rules for command messages.

use crate::result::ValidationError;

/// One check over a command message.
///
/// `validate` returns `None` when the message passes and the error text otherwise.
/// A rule that reports `stop_processing() == true` prevents every later rule from
/// running once it has failed; a passing rule never stops evaluation.
pub trait ValidationRule<M>: Send + Sync {
    /// Property expression the error is reported against (e.g. `"team_id"`).
    fn property(&self) -> &str;

    fn validate(&self, message: &M) -> Option<String>;

    fn stop_processing(&self) -> bool {
        false
    }
}

type Check<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;

/// Rule built from a predicate: the message is valid when the predicate holds.
pub struct PredicateRule<M> {
    property: String,
    message: String,
    check: Check<M>,
    stop: bool,
}

impl<M> PredicateRule<M> {
    pub fn new(
        property: impl Into<String>,
        message: impl Into<String>,
        check: impl Fn(&M) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
            check: Box::new(check),
            stop: false,
        }
    }

    /// Skip the remaining rules when this one fails.
    pub fn stop_on_failure(mut self) -> Self {
        self.stop = true;
        self
    }
}

impl<M> core::fmt::Debug for PredicateRule<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PredicateRule")
            .field("property", &self.property)
            .field("message", &self.message)
            .field("stop", &self.stop)
            .finish()
    }
}

impl<M> ValidationRule<M> for PredicateRule<M> {
    fn property(&self) -> &str {
        &self.property
    }

    fn validate(&self, message: &M) -> Option<String> {
        if (self.check)(message) {
            None
        } else {
            Some(self.message.clone())
        }
    }

    fn stop_processing(&self) -> bool {
        self.stop
    }
}

/// Run `rules` in declaration order and collect the failures.
pub fn validate<M>(message: &M, rules: &[Box<dyn ValidationRule<M>>]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for rule in rules {
        if let Some(text) = rule.validate(message) {
            tracing::debug!(property = rule.property(), error = %text, "validation rule failed");
            errors.push(ValidationError::new(rule.property(), text));
            if rule.stop_processing() {
                break;
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Rename {
        id: i64,
        name: String,
    }

    fn rules_with_counter(counter: Arc<AtomicUsize>) -> Vec<Box<dyn ValidationRule<Rename>>> {
        vec![
            Box::new(PredicateRule::new("id", "id is required", |m: &Rename| m.id > 0).stop_on_failure()),
            Box::new(PredicateRule::new("name", "name is required", move |m: &Rename| {
                counter.fetch_add(1, Ordering::SeqCst);
                !m.name.trim().is_empty()
            })),
            Box::new(PredicateRule::new("name", "name is too long", |m: &Rename| m.name.len() <= 10)),
        ]
    }

    #[test]
    fn all_rules_run_when_nothing_stops() {
        let counter = Arc::new(AtomicUsize::new(0));
        let rules = rules_with_counter(counter.clone());
        let message = Rename {
            id: 1,
            name: " ".repeat(12),
        };

        let errors = validate(&message, &rules);
        assert_eq!(
            errors,
            vec![
                ValidationError::new("name", "name is required"),
                ValidationError::new("name", "name is too long"),
            ]
        );
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_stop_rule_short_circuits() {
        let counter = Arc::new(AtomicUsize::new(0));
        let rules = rules_with_counter(counter.clone());
        let message = Rename {
            id: 0,
            name: String::new(),
        };

        let errors = validate(&message, &rules);
        assert_eq!(errors, vec![ValidationError::new("id", "id is required")]);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn passing_stop_rule_does_not_short_circuit() {
        let counter = Arc::new(AtomicUsize::new(0));
        let rules = rules_with_counter(counter.clone());
        let message = Rename {
            id: 5,
            name: "ok".to_string(),
        };

        assert!(validate(&message, &rules).is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
