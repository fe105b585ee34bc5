//! Concrete command messages, their rule sets and their handlers.
//!
//! Handlers resolve the current session through a `SessionProvider`, so they run
//! against whatever unit of work the caller opened for the request.
//!
//! ```text
//! configure(registry, sessions)
//!   ├── staff:  employees, teams, memberships
//!   ├── loans:  loaned items
//!   └── sales:  articles, salesmen, sales
//! ```

pub mod loans;
pub mod rules;
pub mod sales;
pub mod staff;

use thiserror::Error;

use staffroom_commands::CommandRegistry;
use staffroom_core::DomainError;

use crate::repository::RepositoryError;
use crate::session::{SessionError, SessionProvider};

pub use loans::{
    LendItemCommandMessage, RegisterLoanedItemCommandMessage, ReturnItemCommandMessage,
};
pub use rules::SessionRule;
pub use sales::{
    RecordSaleCommandMessage, RegisterArticleCommandMessage, RegisterSalesmanCommandMessage,
};
pub use staff::{
    AssignEmployeeToTeamCommandMessage, CreateEmployeeCommandMessage, CreateTeamCommandMessage,
    DeleteEmployeeCommandMessage, RemoveEmployeeFromTeamCommandMessage,
    UpdateEmployeeCommandMessage, UpdateTeamEmployeeCommandMessage,
};

/// Failure of a command handler. Always aborts the surrounding unit of work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Register every command configuration against `sessions`.
pub fn configure(registry: &mut CommandRegistry, sessions: &SessionProvider) {
    staff::configure(registry, sessions);
    loans::configure(registry, sessions);
    sales::configure(registry, sessions);
    tracing::debug!(commands = registry.len(), "command configurations registered");
}
