//! Generic command-processing pipeline.
//!
//! A UI message is mapped to a command message, validated against the rule set
//! declared for that command type and, when no rule objects, handed to the
//! command's handler:
//!
//! ```text
//! UI message ──map──▶ command message ──validate──▶ handler ──▶ ExecutionResult
//! ```

pub mod configuration;
pub mod handler;
pub mod mapper;
pub mod message;
pub mod processor;
pub mod result;
pub mod validation;

pub use configuration::{CommandConfiguration, CommandRegistry};
pub use handler::CommandHandler;
pub use mapper::{MappingRegistry, MessageMapper};
pub use message::CommandMessage;
pub use processor::{MessageProcessor, ProcessError};
pub use result::{ExecutionResult, ValidationError};
pub use validation::{PredicateRule, ValidationRule, validate};
