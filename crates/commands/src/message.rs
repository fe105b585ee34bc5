/// A command message is a DTO describing a requested state change.
///
/// Command messages are **transient**: they are built from UI input, validated,
/// handed to exactly one handler and then dropped. Rejections surface as
/// validation errors on the `ExecutionResult`, never as panics.
///
/// Messages must be `Send + Sync + 'static` so the registry can key configurations
/// by `TypeId` and share them across request threads.
pub trait CommandMessage: core::fmt::Debug + Send + Sync + 'static {
    /// Short name used in logs.
    fn command_name(&self) -> &'static str {
        let full = core::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}
