//! Session instance scoping.
//!
//! The provider decides which session a piece of work runs against:
//!
//! - `Request`: a fresh session per request, bound for the duration of the
//!   request future;
//! - `Thread`: one session per OS thread;
//! - `Singleton`: one session for the whole process (single-threaded hosts,
//!   tooling, tests).
//!
//! Whatever the strategy, the chosen session is bound as the *ambient* session of
//! the running task, and `current()` prefers it. That keeps a request on one
//! session even when the runtime moves the task between worker threads.
//!
//! A shared session (thread or singleton) is bound to at most one scope at a
//! time. Async runtimes interleave many requests on one thread, so a scope that
//! finds the shared session taken runs on a private session of its own instead.

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use serde::{Deserialize, Serialize};

use super::{Database, Session, SessionError};

tokio::task_local! {
    static AMBIENT_SESSION: Arc<Session>;
}

/// Session bound to the running task, if any.
pub fn ambient() -> Result<Arc<Session>, SessionError> {
    AMBIENT_SESSION
        .try_with(Arc::clone)
        .map_err(|_| SessionError::NoAmbientSession)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionScope {
    #[default]
    Request,
    Thread,
    Singleton,
}

impl FromStr for SessionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "request" | "web" | "http" => Ok(SessionScope::Request),
            "thread" => Ok(SessionScope::Thread),
            "singleton" => Ok(SessionScope::Singleton),
            other => Err(format!(
                "unknown session scope '{other}' (expected request, thread or singleton)"
            )),
        }
    }
}

/// Resolves sessions according to a `SessionScope`.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    inner: Arc<ProviderInner>,
}

/// Thread sessions live here, so dropping the last provider handle drops them.
#[derive(Debug)]
struct ProviderInner {
    scope: SessionScope,
    database: Arc<Database>,
    singleton: Arc<Session>,
    threads: Mutex<HashMap<ThreadId, Arc<Session>>>,
}

/// A session bound to one scope. Releases its claim on a shared session on drop.
struct Binding {
    session: Arc<Session>,
    claimed: bool,
}

impl Drop for Binding {
    fn drop(&mut self) {
        if self.claimed {
            self.session.release();
        }
    }
}

impl SessionProvider {
    pub fn new(database: Arc<Database>, scope: SessionScope) -> Self {
        let singleton = database.open_session();
        Self {
            inner: Arc::new(ProviderInner {
                scope,
                database,
                singleton,
                threads: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn scope_kind(&self) -> SessionScope {
        self.inner.scope
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.inner.database
    }

    /// The session the caller should use right now.
    ///
    /// The ambient session wins when one is bound. Otherwise `Request` scope has no
    /// session to offer outside a request.
    pub fn current(&self) -> Result<Arc<Session>, SessionError> {
        if let Ok(session) = ambient() {
            return Ok(session);
        }
        match self.inner.scope {
            SessionScope::Request => Err(SessionError::NoAmbientSession),
            SessionScope::Thread => Ok(self.thread_session()),
            SessionScope::Singleton => Ok(Arc::clone(&self.inner.singleton)),
        }
    }

    /// Session a new scope should be bound to.
    fn bind(&self) -> Binding {
        let shared = match self.inner.scope {
            SessionScope::Request => None,
            SessionScope::Thread => Some(self.thread_session()),
            SessionScope::Singleton => Some(Arc::clone(&self.inner.singleton)),
        };
        match shared {
            Some(session) if session.try_claim() => Binding {
                session,
                claimed: true,
            },
            Some(busy) => {
                let session = self.inner.database.open_session();
                tracing::debug!(
                    scope = ?self.inner.scope,
                    busy_session_id = %busy.id(),
                    session_id = %session.id(),
                    "shared session is bound elsewhere; using a private session"
                );
                Binding {
                    session,
                    claimed: false,
                }
            }
            None => Binding {
                session: self.inner.database.open_session(),
                claimed: false,
            },
        }
    }

    /// Run `future` with a session bound as the ambient session.
    pub async fn scope<F: Future>(&self, future: F) -> F::Output {
        let binding = self.bind();
        AMBIENT_SESSION
            .scope(Arc::clone(&binding.session), future)
            .await
    }

    /// Synchronous counterpart of [`SessionProvider::scope`].
    pub fn sync_scope<R>(&self, work: impl FnOnce() -> R) -> R {
        let binding = self.bind();
        AMBIENT_SESSION.sync_scope(Arc::clone(&binding.session), work)
    }

    fn thread_session(&self) -> Arc<Session> {
        let mut threads = self
            .inner
            .threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            threads
                .entry(thread::current().id())
                .or_insert_with(|| self.inner.database.open_session()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_scope_has_no_session_outside_a_request() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Request);
        assert_eq!(provider.current().unwrap_err(), SessionError::NoAmbientSession);
    }

    #[test]
    fn request_scope_opens_a_fresh_session_per_scope() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Request);
        let first = provider.sync_scope(|| provider.current().unwrap().id());
        let second = provider.sync_scope(|| provider.current().unwrap().id());
        assert_ne!(first, second);
    }

    #[test]
    fn singleton_scope_always_returns_the_same_session() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Singleton);
        let a = provider.current().unwrap();
        let b = provider.current().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let inside = provider.sync_scope(|| provider.current().unwrap());
        assert!(Arc::ptr_eq(&a, &inside));
    }

    #[test]
    fn thread_scope_gives_each_thread_its_own_session() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Thread);
        let here = provider.current().unwrap();
        assert!(Arc::ptr_eq(&here, &provider.current().unwrap()));

        let other = provider.clone();
        let there = std::thread::spawn(move || other.current().unwrap().id())
            .join()
            .unwrap();
        assert_ne!(here.id(), there);
    }

    #[tokio::test]
    async fn async_scope_binds_ambient_session() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Request);
        let id = provider
            .scope(async { ambient().map(|s| s.id()) })
            .await
            .unwrap();
        assert!(ambient().is_err());
        assert_ne!(id, provider.sync_scope(|| ambient().unwrap().id()));
    }

    #[tokio::test]
    async fn overlapping_scopes_on_one_thread_get_separate_sessions() {
        for kind in [SessionScope::Thread, SessionScope::Singleton] {
            let provider = SessionProvider::new(Database::new(), kind);
            let shared = provider.current().unwrap().id();

            let held = provider.scope(async {
                let session = ambient().unwrap();
                session.begin().unwrap();
                tokio::task::yield_now().await;
                session.commit().unwrap();
                session.id()
            });
            let overlapping = provider.scope(async {
                let session = ambient().unwrap();
                session.begin().unwrap();
                session.commit().unwrap();
                session.id()
            });
            let (held, overlapping) = tokio::join!(held, overlapping);

            assert_eq!(held, shared, "{kind:?}");
            assert_ne!(overlapping, shared, "{kind:?}");
            assert_eq!(provider.sync_scope(|| ambient().unwrap().id()), shared, "{kind:?}");
        }
    }

    #[test]
    fn nested_scope_does_not_share_the_claimed_session() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Singleton);
        let (outer, inner) = provider.sync_scope(|| {
            let outer = ambient().unwrap().id();
            (outer, provider.sync_scope(|| ambient().unwrap().id()))
        });
        assert_eq!(outer, provider.current().unwrap().id());
        assert_ne!(outer, inner);
    }

    #[test]
    fn dropping_the_provider_releases_its_thread_sessions() {
        let provider = SessionProvider::new(Database::new(), SessionScope::Thread);
        let here = Arc::downgrade(&provider.current().unwrap());

        let other = provider.clone();
        let there = std::thread::spawn(move || Arc::downgrade(&other.current().unwrap()))
            .join()
            .unwrap();

        assert!(here.upgrade().is_some());
        assert!(there.upgrade().is_some());
        drop(provider);
        assert!(here.upgrade().is_none());
        assert!(there.upgrade().is_none());
    }

    #[test]
    fn scope_names_parse() {
        assert_eq!("Thread".parse::<SessionScope>().unwrap(), SessionScope::Thread);
        assert_eq!("web".parse::<SessionScope>().unwrap(), SessionScope::Request);
        assert!("galaxy".parse::<SessionScope>().is_err());
    }
}
