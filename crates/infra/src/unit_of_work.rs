//! Unit of work: a transactional scope around a set of persistence operations.
//!
//! ## Lifecycle
//!
//! ```text
//! start() ──▶ begin ──▶ work ──▶ commit
//!                          └──▶ rollback (work failed, or commit failed)
//! drop without commit ──▶ rollback
//! ```
//!
//! The process-wide factory is configured once at startup (`configure` or
//! `configure_ambient_session`); request middleware then calls `start()` at request
//! begin and commits at request end.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use uuid::Uuid;

use crate::session::{self, Session, SessionError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitOfWorkError {
    #[error("unit of work factory is not configured")]
    NotConfigured,

    #[error("unit of work {0} is not active")]
    NotActive(Uuid),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Request-scoped transactional handle.
///
/// Dropping an active unit of work rolls it back.
pub trait UnitOfWork: Send {
    fn id(&self) -> Uuid;
    fn begin(&mut self) -> Result<(), UnitOfWorkError>;
    fn commit(&mut self) -> Result<(), UnitOfWorkError>;
    fn rollback(&mut self) -> Result<(), UnitOfWorkError>;
    fn is_active(&self) -> bool;
}

/// Unit of work over a persistence session.
#[derive(Debug)]
pub struct SessionUnitOfWork {
    id: Uuid,
    session: Arc<Session>,
    active: bool,
}

impl SessionUnitOfWork {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session,
            active: false,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl UnitOfWork for SessionUnitOfWork {
    fn id(&self) -> Uuid {
        self.id
    }

    fn begin(&mut self) -> Result<(), UnitOfWorkError> {
        self.session.begin()?;
        self.active = true;
        tracing::debug!(uow_id = %self.id, session_id = %self.session.id(), "unit of work begun");
        Ok(())
    }

    /// A failed commit leaves nothing applied; the unit of work is closed either way.
    fn commit(&mut self) -> Result<(), UnitOfWorkError> {
        if !self.active {
            return Err(UnitOfWorkError::NotActive(self.id));
        }
        self.active = false;
        match self.session.commit() {
            Ok(()) => {
                tracing::debug!(uow_id = %self.id, "unit of work committed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(uow_id = %self.id, error = %err, "unit of work commit failed, rolled back");
                Err(err.into())
            }
        }
    }

    fn rollback(&mut self) -> Result<(), UnitOfWorkError> {
        if !self.active {
            return Err(UnitOfWorkError::NotActive(self.id));
        }
        self.active = false;
        self.session.rollback()?;
        tracing::debug!(uow_id = %self.id, "unit of work rolled back");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SessionUnitOfWork {
    fn drop(&mut self) {
        if self.active {
            tracing::warn!(uow_id = %self.id, "unit of work dropped while active; rolling back");
            let _ = self.rollback();
        }
    }
}

pub type UnitOfWorkFactory =
    Arc<dyn Fn() -> Result<Box<dyn UnitOfWork>, UnitOfWorkError> + Send + Sync>;

static FACTORY: RwLock<Option<UnitOfWorkFactory>> = RwLock::new(None);

/// Install the process-wide unit of work factory (replacing any previous one).
pub fn configure(
    factory: impl Fn() -> Result<Box<dyn UnitOfWork>, UnitOfWorkError> + Send + Sync + 'static,
) {
    if let Ok(mut slot) = FACTORY.write() {
        *slot = Some(Arc::new(factory));
    }
}

/// Install the factory that binds each unit of work to the ambient session.
pub fn configure_ambient_session() {
    configure(|| {
        let session = session::ambient()?;
        Ok(Box::new(SessionUnitOfWork::new(session)) as Box<dyn UnitOfWork>)
    });
}

/// Obtain a begun unit of work from the process-wide factory.
pub fn start() -> Result<Box<dyn UnitOfWork>, UnitOfWorkError> {
    let factory = FACTORY
        .read()
        .ok()
        .and_then(|slot| slot.clone())
        .ok_or(UnitOfWorkError::NotConfigured)?;
    let mut uow = factory()?;
    uow.begin()?;
    Ok(uow)
}

/// Close `uow` according to `outcome`: commit on success, roll back on failure.
///
/// A failed commit is surfaced as the error of the whole unit.
pub fn complete<T, E>(uow: &mut dyn UnitOfWork, outcome: Result<T, E>) -> Result<T, E>
where
    E: From<UnitOfWorkError>,
{
    match outcome {
        Ok(value) => {
            uow.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback() {
                tracing::error!(uow_id = %uow.id(), error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Run `work` inside a unit of work obtained from the process-wide factory.
pub fn run<T, E>(work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
where
    E: From<UnitOfWorkError>,
{
    let mut uow = start()?;
    let outcome = work();
    complete(uow.as_mut(), outcome)
}
