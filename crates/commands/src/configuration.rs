//! Per-command configuration: the validation rule set and the handler.
//!
//! The registry is the rule factory of the pipeline: given a command type it
//! resolves the rules (and handler) declared for it.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::handler::CommandHandler;
use crate::message::CommandMessage;
use crate::validation::ValidationRule;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Handler with its output and error types erased.
pub(crate) trait ErasedHandler<M>: Send + Sync {
    fn output_type(&self) -> (TypeId, &'static str);
    fn handle(&self, message: &M) -> Result<Box<dyn Any + Send>, BoxError>;
}

struct HandlerAdapter<H>(H);

impl<M, H> ErasedHandler<M> for HandlerAdapter<H>
where
    M: CommandMessage,
    H: CommandHandler<M>,
{
    fn output_type(&self) -> (TypeId, &'static str) {
        (
            TypeId::of::<H::Output>(),
            core::any::type_name::<H::Output>(),
        )
    }

    fn handle(&self, message: &M) -> Result<Box<dyn Any + Send>, BoxError> {
        self.0
            .handle(message)
            .map(|output| Box::new(output) as Box<dyn Any + Send>)
            .map_err(|e| Box::new(e) as BoxError)
    }
}

/// Declarative definition of one command type.
pub struct CommandConfiguration<M> {
    rules: Vec<Box<dyn ValidationRule<M>>>,
    handler: Box<dyn ErasedHandler<M>>,
}

impl<M: CommandMessage> CommandConfiguration<M> {
    pub fn new<H>(handler: H) -> Self
    where
        H: CommandHandler<M> + 'static,
    {
        Self {
            rules: Vec::new(),
            handler: Box::new(HandlerAdapter(handler)),
        }
    }

    /// Append a rule; rules run in the order they are declared.
    pub fn rule(mut self, rule: impl ValidationRule<M> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rules(&self) -> &[Box<dyn ValidationRule<M>>] {
        &self.rules
    }

    pub(crate) fn handler(&self) -> &dyn ErasedHandler<M> {
        self.handler.as_ref()
    }
}

impl<M> core::fmt::Debug for CommandConfiguration<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandConfiguration")
            .field("command", &core::any::type_name::<M>())
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Command configurations keyed by command message type.
#[derive(Default)]
pub struct CommandRegistry {
    configurations: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the configuration for `M`.
    pub fn register<M: CommandMessage>(&mut self, configuration: CommandConfiguration<M>) -> &mut Self {
        let replaced = self
            .configurations
            .insert(TypeId::of::<M>(), Box::new(configuration))
            .is_some();
        if replaced {
            tracing::warn!(
                command = core::any::type_name::<M>(),
                "command configuration replaced"
            );
        }
        self
    }

    pub fn configuration<M: CommandMessage>(&self) -> Option<&CommandConfiguration<M>> {
        self.configurations
            .get(&TypeId::of::<M>())
            .and_then(|c| c.downcast_ref::<CommandConfiguration<M>>())
    }

    /// Rules declared for `M`; empty when `M` is not registered.
    pub fn rules_for<M: CommandMessage>(&self) -> &[Box<dyn ValidationRule<M>>] {
        self.configuration::<M>().map(|c| c.rules()).unwrap_or(&[])
    }

    pub fn contains<M: CommandMessage>(&self) -> bool {
        self.configurations.contains_key(&TypeId::of::<M>())
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

impl core::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.configurations.len())
            .finish()
    }
}
