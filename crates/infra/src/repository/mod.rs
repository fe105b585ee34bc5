//! Repositories over the persistence session.
//!
//! `Repository<E>` is the generic CRUD surface. Entity-specific queries (eager
//! views, paging, lookups) live in extension traits implemented for
//! `SessionRepository<E>`, so every repository shares the same session handle.

pub mod employees;
pub mod loaned_items;
pub mod sales;
pub mod teams;

use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;

use staffroom_core::{DomainError, Entity, EntityId};

use crate::session::{Mapped, Session, SessionError};

pub use employees::{EmployeeRepository, EmployeeView};
pub use loaned_items::LoanedItemRepository;
pub use sales::SalesmanArticleRepository;
pub use teams::{TeamEmployeeRepository, TeamRepository, TeamView};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: EntityId },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RepositoryError {
    pub fn not_found<E: Mapped>(id: EntityId) -> Self {
        Self::NotFound {
            entity: E::TABLE,
            id,
        }
    }
}

/// Generic CRUD over one entity type.
pub trait Repository<E: Mapped> {
    fn delete(&self, entity: &E) -> Result<(), RepositoryError>;
    fn get_all(&self) -> Result<Vec<E>, RepositoryError>;
    fn get_by_id(&self, id: EntityId) -> Result<Option<E>, RepositoryError>;

    /// Insert a transient entity (assigning its id) or update a persisted one.
    fn save_or_update(&self, entity: &mut E) -> Result<(), RepositoryError>;

    /// Copy the entity's state onto the persistent row, inserting when needed.
    fn merge(&self, entity: E) -> Result<E, RepositoryError>;

    /// `get_by_id` that treats a missing row as an error.
    fn load(&self, id: EntityId) -> Result<E, RepositoryError> {
        self.get_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found::<E>(id))
    }
}

/// Repository bound to one session.
pub struct SessionRepository<E> {
    session: Arc<Session>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SessionRepository<E> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl<E> Clone for SessionRepository<E> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.session))
    }
}

impl<E> core::fmt::Debug for SessionRepository<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionRepository")
            .field("entity", &core::any::type_name::<E>())
            .field("session", &self.session.id())
            .finish()
    }
}

impl<E: Mapped> Repository<E> for SessionRepository<E> {
    fn delete(&self, entity: &E) -> Result<(), RepositoryError> {
        if self.session.delete::<E>(entity.id())? {
            Ok(())
        } else {
            Err(RepositoryError::not_found::<E>(entity.id()))
        }
    }

    fn get_all(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.session.list::<E>()?)
    }

    fn get_by_id(&self, id: EntityId) -> Result<Option<E>, RepositoryError> {
        Ok(self.session.get::<E>(id)?)
    }

    fn save_or_update(&self, entity: &mut E) -> Result<(), RepositoryError> {
        if entity.is_transient() {
            self.session.insert(entity)?;
            return Ok(());
        }
        match self.session.update(entity) {
            Ok(()) => Ok(()),
            Err(SessionError::NotFound { id, .. }) => Err(RepositoryError::not_found::<E>(id)),
            Err(err) => Err(err.into()),
        }
    }

    fn merge(&self, entity: E) -> Result<E, RepositoryError> {
        Ok(self.session.merge(entity)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Database;
    use staffroom_staff::Team;

    fn repo() -> SessionRepository<Team> {
        SessionRepository::new(Database::new().open_session())
    }

    #[test]
    fn save_assigns_identity_then_updates() {
        let repo = repo();
        let mut team = Team::new("Ops", "").unwrap();
        repo.save_or_update(&mut team).unwrap();
        assert_eq!(team.id(), EntityId::new(1));

        team.set_description("on call");
        repo.save_or_update(&mut team).unwrap();

        let stored = repo.load(team.id()).unwrap();
        assert_eq!(stored.description(), "on call");
        assert_eq!(repo.get_all().unwrap().len(), 1);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let repo = repo();
        let mut team = Team::new("Ops", "").unwrap();
        team.set_id(EntityId::new(42));
        assert_eq!(
            repo.save_or_update(&mut team),
            Err(RepositoryError::NotFound {
                entity: "teams",
                id: EntityId::new(42)
            })
        );
    }

    #[test]
    fn delete_removes_and_reports_missing() {
        let repo = repo();
        let mut team = Team::new("Ops", "").unwrap();
        repo.save_or_update(&mut team).unwrap();

        repo.delete(&team).unwrap();
        assert!(repo.get_by_id(team.id()).unwrap().is_none());
        assert!(matches!(repo.delete(&team), Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn merge_of_unknown_persisted_id_inserts() {
        let repo = repo();
        let mut team = Team::new("Ops", "").unwrap();
        team.set_id(EntityId::new(7));
        let merged = repo.merge(team).unwrap();
        assert_eq!(merged.id(), EntityId::new(7));
        assert!(repo.get_by_id(EntityId::new(7)).unwrap().is_some());

        let mut next = Team::new("Dev", "").unwrap();
        repo.save_or_update(&mut next).unwrap();
        assert_eq!(next.id(), EntityId::new(8));
    }
}
