//! Staff domain module: employees, teams and the items they borrow.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Associations are held as id
//! sets on both sides and the mutating methods keep the two sides in step.

pub mod employee;
pub mod loaned_item;
pub mod team;

pub use employee::Employee;
pub use loaned_item::{LoanState, LoanedItem, LoanedItemKind};
pub use team::{Team, TeamEmployee};
