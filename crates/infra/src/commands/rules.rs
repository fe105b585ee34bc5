//! Validation rules that consult persistent state.

use std::sync::Arc;

use staffroom_commands::{PredicateRule, ValidationRule};
use staffroom_core::EntityId;

use crate::repository::{Repository, RepositoryError, SessionRepository};
use crate::session::{Mapped, Session, SessionProvider};

type SessionCheck<M> = Box<dyn Fn(&M, &Arc<Session>) -> Result<bool, RepositoryError> + Send + Sync>;

/// Rule whose predicate reads through the current session.
///
/// A check that cannot run (no session, storage failure) counts as a failure of the
/// rule; the cause is logged.
pub struct SessionRule<M> {
    property: String,
    message: String,
    sessions: SessionProvider,
    check: SessionCheck<M>,
    stop: bool,
}

impl<M> SessionRule<M> {
    pub fn new(
        property: impl Into<String>,
        message: impl Into<String>,
        sessions: &SessionProvider,
        check: impl Fn(&M, &Arc<Session>) -> Result<bool, RepositoryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
            sessions: sessions.clone(),
            check: Box::new(check),
            stop: false,
        }
    }

    pub fn stop_on_failure(mut self) -> Self {
        self.stop = true;
        self
    }
}

impl<M> core::fmt::Debug for SessionRule<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionRule")
            .field("property", &self.property)
            .field("message", &self.message)
            .field("stop", &self.stop)
            .finish()
    }
}

impl<M: Send + Sync> ValidationRule<M> for SessionRule<M> {
    fn property(&self) -> &str {
        &self.property
    }

    fn validate(&self, message: &M) -> Option<String> {
        let outcome = self
            .sessions
            .current()
            .map_err(RepositoryError::from)
            .and_then(|session| (self.check)(message, &session));
        match outcome {
            Ok(true) => None,
            Ok(false) => Some(self.message.clone()),
            Err(err) => {
                tracing::warn!(property = %self.property, error = %err, "rule check could not run");
                Some(self.message.clone())
            }
        }
    }

    fn stop_processing(&self) -> bool {
        self.stop
    }
}

/// The referenced `E` must exist. Stops processing on failure, since later rules
/// usually dereference it.
pub fn exists<M, E>(
    property: &str,
    message: &str,
    sessions: &SessionProvider,
    id: fn(&M) -> EntityId,
) -> SessionRule<M>
where
    M: Send + Sync + 'static,
    E: Mapped,
{
    SessionRule::new(property, message, sessions, move |m: &M, session: &Arc<Session>| {
        let key = id(m);
        if key.is_transient() {
            return Ok(false);
        }
        Ok(SessionRepository::<E>::new(Arc::clone(session))
            .get_by_id(key)?
            .is_some())
    })
    .stop_on_failure()
}

/// A trimmed string field must be non-empty.
pub fn required<M: 'static>(property: &str, message: &str, field: fn(&M) -> &str) -> PredicateRule<M> {
    PredicateRule::new(property, message, move |m: &M| !field(m).trim().is_empty())
}

/// A string field must not exceed `max` characters.
pub fn max_length<M: 'static>(property: &str, max: usize, field: fn(&M) -> &str) -> PredicateRule<M> {
    PredicateRule::new(
        property,
        format!("must be at most {max} characters"),
        move |m: &M| field(m).chars().count() <= max,
    )
}
