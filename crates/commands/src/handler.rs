use crate::CommandMessage;

/// Executes a validated command message (command handler abstraction).
///
/// Handlers only run once every validation rule for the message passed. Their
/// errors are infrastructure or domain failures that must abort the surrounding
/// unit of work, so they are propagated rather than collected as validation errors.
///
/// The error type is associated so each handler keeps its own error model; the
/// processor boxes it at the boundary.
pub trait CommandHandler<M: CommandMessage>: Send + Sync {
    type Output: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn handle(&self, message: &M) -> Result<Self::Output, Self::Error>;
}
