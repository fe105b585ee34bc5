//! Infrastructure layer: persistence session, unit of work, repositories and the
//! concrete command set.

pub mod commands;
pub mod repository;
pub mod session;
pub mod unit_of_work;


pub use session::{Database, Session, SessionProvider, SessionScope};
pub use unit_of_work::{SessionUnitOfWork, UnitOfWork, UnitOfWorkError};
