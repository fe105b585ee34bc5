//! Message processing pipeline (application-level orchestration).
//!
//! ```text
//! UI message
//!   ↓
//! 1. Map to the destination command message (pluggable mapper)
//!   ↓
//! 2. Resolve the command configuration (rules + handler)
//!   ↓
//! 3. Validate in declaration order (stop-processing rules short-circuit)
//!   ↓
//! 4. Execute the handler when no rule failed
//!   ↓
//! ExecutionResult
//! ```
//!
//! Validation failures are data: they come back inside `ExecutionResult`. Missing
//! wiring and handler failures are `ProcessError`s, so the caller's unit of work can
//! roll back.

use std::any::{Any, TypeId, type_name};

use thiserror::Error;

use crate::configuration::{BoxError, CommandRegistry};
use crate::mapper::{MappingRegistry, MessageMapper, map_message};
use crate::message::CommandMessage;
use crate::result::ExecutionResult;
use crate::validation::validate;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// No mapping from the UI message type to the command type.
    #[error("no mapping from {from} to {to}")]
    MissingMapping {
        from: &'static str,
        to: &'static str,
    },

    /// No configuration registered for the command type.
    #[error("no configuration registered for {0}")]
    MissingConfiguration(&'static str),

    /// The handler produces a different result type than the caller asked for.
    #[error("handler for {command} returns {actual}, caller expected {expected}")]
    ResultTypeMismatch {
        command: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// The handler failed (domain or persistence failure).
    #[error("handler for {command} failed: {source}")]
    Handler {
        command: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ProcessError {
    /// Downcast the handler failure to a concrete error type.
    pub fn handler_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            ProcessError::Handler { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Runs UI messages through mapping, validation and execution.
pub struct MessageProcessor<Mp = MappingRegistry> {
    registry: CommandRegistry,
    mapper: Mp,
}

impl<Mp: MessageMapper> MessageProcessor<Mp> {
    pub fn new(registry: CommandRegistry, mapper: Mp) -> Self {
        Self { registry, mapper }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn mapper(&self) -> &Mp {
        &self.mapper
    }

    /// Map `message` (declared as `U`) to the command type `C`, then validate and
    /// execute it, expecting the handler to produce `R`.
    pub fn process<U, C, R>(&self, message: &U) -> Result<ExecutionResult<R>, ProcessError>
    where
        U: Any + Send + Sync,
        C: CommandMessage,
        R: 'static,
    {
        let command: C = map_message(&self.mapper, message).ok_or(ProcessError::MissingMapping {
            from: type_name::<U>(),
            to: type_name::<C>(),
        })?;
        self.process_command(&command)
    }

    /// Validate and execute an already-built command message.
    pub fn process_command<C, R>(&self, command: &C) -> Result<ExecutionResult<R>, ProcessError>
    where
        C: CommandMessage,
        R: 'static,
    {
        let name = command.command_name();
        let span = tracing::info_span!("process_command", command = name);
        let _entered = span.enter();

        let configuration = self
            .registry
            .configuration::<C>()
            .ok_or(ProcessError::MissingConfiguration(type_name::<C>()))?;

        let handler = configuration.handler();
        let (output_id, output_name) = handler.output_type();
        if output_id != TypeId::of::<R>() {
            return Err(ProcessError::ResultTypeMismatch {
                command: type_name::<C>(),
                expected: type_name::<R>(),
                actual: output_name,
            });
        }

        let errors = validate(command, configuration.rules());
        if !errors.is_empty() {
            tracing::info!(errors = errors.len(), "command rejected by validation");
            return Ok(ExecutionResult::failed(errors));
        }

        let output = handler.handle(command).map_err(|source| {
            tracing::warn!(error = %source, "command handler failed");
            ProcessError::Handler {
                command: type_name::<C>(),
                source,
            }
        })?;

        let output = output
            .downcast::<R>()
            .map_err(|_| ProcessError::ResultTypeMismatch {
                command: type_name::<C>(),
                expected: type_name::<R>(),
                actual: output_name,
            })?;

        tracing::debug!("command executed");
        Ok(ExecutionResult::succeeded(*output))
    }
}

impl<Mp> core::fmt::Debug for MessageProcessor<Mp> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageProcessor")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::CommandConfiguration;
    use crate::handler::CommandHandler;
    use crate::validation::PredicateRule;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct RenameTeamForm {
        team: String,
        new_name: String,
    }

    #[derive(Debug, Clone)]
    struct RenameTeamCommandMessage {
        team_id: i64,
        name: String,
    }

    impl CommandMessage for RenameTeamCommandMessage {}

    #[derive(Debug, Error)]
    #[error("team {0} vanished")]
    struct Vanished(i64);

    struct RenameTeamHandler {
        calls: Arc<AtomicUsize>,
    }

    impl CommandHandler<RenameTeamCommandMessage> for RenameTeamHandler {
        type Output = String;
        type Error = Vanished;

        fn handle(&self, message: &RenameTeamCommandMessage) -> Result<String, Vanished> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if message.team_id == 404 {
                return Err(Vanished(message.team_id));
            }
            Ok(format!("team {} renamed to {}", message.team_id, message.name))
        }
    }

    fn processor(calls: Arc<AtomicUsize>) -> MessageProcessor {
        let mut registry = CommandRegistry::new();
        registry.register(
            CommandConfiguration::new(RenameTeamHandler { calls })
                .rule(
                    PredicateRule::new("team_id", "team is required", |m: &RenameTeamCommandMessage| {
                        m.team_id > 0
                    })
                    .stop_on_failure(),
                )
                .rule(PredicateRule::new(
                    "name",
                    "name is required",
                    |m: &RenameTeamCommandMessage| !m.name.is_empty(),
                )),
        );

        let mut mapper = MappingRegistry::new();
        mapper.register::<RenameTeamForm, RenameTeamCommandMessage>(|form| {
            RenameTeamCommandMessage {
                team_id: form.team.parse().unwrap_or(0),
                name: form.new_name.trim().to_string(),
            }
        });

        MessageProcessor::new(registry, mapper)
    }

    fn form(team: &str, new_name: &str) -> RenameTeamForm {
        RenameTeamForm {
            team: team.to_string(),
            new_name: new_name.to_string(),
        }
    }

    #[test]
    fn valid_message_is_mapped_and_executed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let processor = processor(calls.clone());

        let result = processor
            .process::<_, RenameTeamCommandMessage, String>(&form("7", " Ops "))
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.result().map(String::as_str), Some("team 7 renamed to Ops"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validation_errors_are_collected_and_handler_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let processor = processor(calls.clone());

        let result = processor
            .process::<_, RenameTeamCommandMessage, String>(&form("7", "   "))
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.errors_for("name").collect::<Vec<_>>(), vec!["name is required"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_processing_rule_hides_later_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let processor = processor(calls.clone());

        let result = processor
            .process::<_, RenameTeamCommandMessage, String>(&form("abc", ""))
            .unwrap();

        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].property, "team_id");
    }

    #[test]
    fn handler_failure_propagates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let processor = processor(calls);

        let err = processor
            .process::<_, RenameTeamCommandMessage, String>(&form("404", "Ops"))
            .unwrap_err();

        assert!(matches!(err, ProcessError::Handler { .. }));
        assert!(err.handler_error::<Vanished>().is_some());
    }

    #[test]
    fn missing_mapping_is_reported() {
        let processor = processor(Arc::new(AtomicUsize::new(0)));

        let err = processor
            .process::<_, RenameTeamCommandMessage, String>(&"not a form".to_string())
            .unwrap_err();
        assert!(matches!(err, ProcessError::MissingMapping { .. }));
    }

    #[test]
    fn missing_configuration_is_reported() {
        let processor = MessageProcessor::new(CommandRegistry::new(), MappingRegistry::new());
        let command = RenameTeamCommandMessage {
            team_id: 1,
            name: "x".to_string(),
        };

        let err = processor
            .process_command::<_, String>(&command)
            .unwrap_err();
        assert!(matches!(err, ProcessError::MissingConfiguration(_)));
    }

    #[test]
    fn wrong_result_type_is_reported_before_execution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let processor = processor(calls.clone());
        let command = RenameTeamCommandMessage {
            team_id: 1,
            name: "x".to_string(),
        };

        let err = processor.process_command::<_, u64>(&command).unwrap_err();
        assert!(matches!(err, ProcessError::ResultTypeMismatch { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
