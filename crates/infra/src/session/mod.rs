//! Transactional persistence session over typed in-memory tables.
//!
//! A `Database` holds the committed tables and the identity sequences. A `Session`
//! is the handle repositories work through:
//!
//! - outside a transaction every write is applied immediately (autocommit);
//! - inside a transaction reads see the session's own writes, writes are recorded
//!   and replayed atomically on the committed tables at `commit`, and `rollback`
//!   discards them.
//!
//! Every row carries a version that each write bumps. A transaction remembers the
//! version of each row it writes as of its snapshot; `commit` refuses with
//! `SessionError::Conflict` when any of those rows was written by someone else in
//! the meantime.
//!
//! Identity values are drawn from per-table sequences when a transient entity is
//! first inserted and are never reused, even when the transaction rolls back.

pub mod mapping;
pub mod scope;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use uuid::Uuid;

use staffroom_core::{Entity, EntityId};

pub use mapping::{Mapped, Tables};
pub use scope::{SessionProvider, SessionScope, ambient};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a transaction is already active on session {0}")]
    AlreadyActive(Uuid),

    #[error("no active transaction on session {0}")]
    NotActive(Uuid),

    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: EntityId },

    /// A write collided with stored state: the entity was already persisted, or a
    /// row the transaction wrote was changed by another session before commit.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("no session is bound to the current request")]
    NoAmbientSession,

    #[error("session lock poisoned")]
    Poisoned,
}

/// Rows of one entity type, ordered by identity.
#[derive(Debug, Clone)]
pub struct Table<E> {
    rows: BTreeMap<EntityId, E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<E: Mapped> Table<E> {
    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Rows in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn upsert(&mut self, entity: E) {
        self.rows.insert(entity.id(), entity);
    }

    fn remove(&mut self, id: EntityId) -> Option<E> {
        self.rows.remove(&id)
    }
}

/// Committed state shared by every session.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
    sequences: Mutex<HashMap<&'static str, i64>>,
}

impl Database {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a new session on this database.
    pub fn open_session(self: &Arc<Self>) -> Arc<Session> {
        let session = Session {
            id: Uuid::now_v7(),
            database: Arc::clone(self),
            transaction: Mutex::new(None),
            claimed: AtomicBool::new(false),
        };
        tracing::debug!(session_id = %session.id, "session opened");
        Arc::new(session)
    }

    fn next_id(&self, table: &'static str) -> Result<EntityId, SessionError> {
        let mut sequences = self.sequences.lock().map_err(|_| SessionError::Poisoned)?;
        let next = sequences.entry(table).or_insert(0);
        *next += 1;
        Ok(EntityId::new(*next))
    }

    /// Move the sequence past an identity assigned outside it (merge of a detached row).
    fn observe_id(&self, table: &'static str, id: EntityId) -> Result<(), SessionError> {
        let mut sequences = self.sequences.lock().map_err(|_| SessionError::Poisoned)?;
        let current = sequences.entry(table).or_insert(0);
        *current = (*current).max(id.value());
        Ok(())
    }
}

type Change = Box<dyn Fn(&mut Tables) -> Result<(), SessionError> + Send>;

struct Transaction {
    working: Tables,
    changes: Vec<Change>,
    /// Snapshot version of every row the transaction wrote.
    observed: HashMap<(&'static str, EntityId), u64>,
}

/// Persistence handle with an optional open transaction.
pub struct Session {
    id: Uuid,
    database: Arc<Database>,
    transaction: Mutex<Option<Transaction>>,
    /// Set while a provider scope has this shared session bound.
    claimed: AtomicBool,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    pub fn is_active(&self) -> bool {
        self.transaction
            .lock()
            .map(|tx| tx.is_some())
            .unwrap_or(false)
    }

    fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.claimed.store(false, Ordering::Release);
    }

    pub fn begin(&self) -> Result<(), SessionError> {
        let mut tx = self.transaction.lock().map_err(|_| SessionError::Poisoned)?;
        if tx.is_some() {
            return Err(SessionError::AlreadyActive(self.id));
        }
        let snapshot = self
            .database
            .tables
            .read()
            .map_err(|_| SessionError::Poisoned)?
            .clone();
        *tx = Some(Transaction {
            working: snapshot,
            changes: Vec::new(),
            observed: HashMap::new(),
        });
        tracing::debug!(session_id = %self.id, "transaction begun");
        Ok(())
    }

    /// Replay the recorded writes on the committed tables.
    ///
    /// Either every write lands or none does; the transaction is closed in both
    /// cases. A row written here and also committed elsewhere since `begin` is a
    /// `Conflict`.
    pub fn commit(&self) -> Result<(), SessionError> {
        let transaction = self
            .transaction
            .lock()
            .map_err(|_| SessionError::Poisoned)?
            .take()
            .ok_or(SessionError::NotActive(self.id))?;

        let mut committed = self
            .database
            .tables
            .write()
            .map_err(|_| SessionError::Poisoned)?;
        for (&(table, id), &seen) in &transaction.observed {
            let current = committed.version(table, id);
            if current != seen {
                tracing::warn!(
                    session_id = %self.id,
                    table,
                    %id,
                    seen,
                    current,
                    "commit refused; row changed since the transaction began"
                );
                return Err(SessionError::Conflict(format!(
                    "{table} {id} was changed by another session"
                )));
            }
        }

        let mut next = committed.clone();
        for change in &transaction.changes {
            if let Err(err) = change(&mut next) {
                tracing::warn!(session_id = %self.id, error = %err, "commit failed; transaction discarded");
                return Err(err);
            }
        }
        *committed = next;
        tracing::debug!(
            session_id = %self.id,
            changes = transaction.changes.len(),
            "transaction committed"
        );
        Ok(())
    }

    pub fn rollback(&self) -> Result<(), SessionError> {
        let transaction = self
            .transaction
            .lock()
            .map_err(|_| SessionError::Poisoned)?
            .take()
            .ok_or(SessionError::NotActive(self.id))?;
        tracing::debug!(
            session_id = %self.id,
            discarded = transaction.changes.len(),
            "transaction rolled back"
        );
        Ok(())
    }

    /// Run a read-only query against the session's view of the tables.
    pub fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> Result<R, SessionError> {
        let tx = self.transaction.lock().map_err(|_| SessionError::Poisoned)?;
        match tx.as_ref() {
            Some(transaction) => Ok(query(&transaction.working)),
            None => {
                let tables = self.database.tables.read().map_err(|_| SessionError::Poisoned)?;
                Ok(query(&tables))
            }
        }
    }

    pub fn get<E: Mapped>(&self, id: EntityId) -> Result<Option<E>, SessionError> {
        self.read(|tables| E::table(tables).get(id).cloned())
    }

    pub fn list<E: Mapped>(&self) -> Result<Vec<E>, SessionError> {
        self.read(|tables| E::table(tables).iter().cloned().collect())
    }

    /// Insert a transient entity, assigning its identity.
    pub fn insert<E: Mapped>(&self, entity: &mut E) -> Result<(), SessionError> {
        if !entity.is_transient() {
            return Err(SessionError::Conflict(format!(
                "{} {} is already persisted",
                E::TABLE,
                entity.id()
            )));
        }
        let id = self.database.next_id(E::TABLE)?;
        entity.set_id(id);
        let row = entity.clone();
        self.write::<E, _>(id, move |table| {
            table.upsert(row.clone());
            Ok(())
        })
    }

    /// Overwrite an existing row.
    pub fn update<E: Mapped>(&self, entity: &E) -> Result<(), SessionError> {
        let row = entity.clone();
        self.write::<E, _>(entity.id(), move |table| {
            if !table.contains(row.id()) {
                return Err(SessionError::NotFound {
                    table: E::TABLE,
                    id: row.id(),
                });
            }
            table.upsert(row.clone());
            Ok(())
        })
    }

    /// Insert or overwrite, returning the persistent copy.
    pub fn merge<E: Mapped>(&self, mut entity: E) -> Result<E, SessionError> {
        if entity.is_transient() {
            self.insert(&mut entity)?;
            return Ok(entity);
        }
        self.database.observe_id(E::TABLE, entity.id())?;
        let row = entity.clone();
        self.write::<E, _>(entity.id(), move |table| {
            table.upsert(row.clone());
            Ok(())
        })?;
        Ok(entity)
    }

    /// Delete a row; returns whether it existed in this session's view.
    pub fn delete<E: Mapped>(&self, id: EntityId) -> Result<bool, SessionError> {
        let existed = self.read(|tables| E::table(tables).contains(id))?;
        if existed {
            self.write::<E, _>(id, move |table| {
                table.remove(id);
                Ok(())
            })?;
        }
        Ok(existed)
    }

    /// Apply `change` to row `id` of `E`'s table, bumping the row version.
    fn write<E, F>(&self, id: EntityId, change: F) -> Result<(), SessionError>
    where
        E: Mapped,
        F: Fn(&mut Table<E>) -> Result<(), SessionError> + Send + 'static,
    {
        let change = move |tables: &mut Tables| -> Result<(), SessionError> {
            change(E::table_mut(tables))?;
            tables.bump(E::TABLE, id);
            Ok(())
        };

        let mut tx = self.transaction.lock().map_err(|_| SessionError::Poisoned)?;
        match tx.as_mut() {
            Some(transaction) => {
                let seen = transaction.working.version(E::TABLE, id);
                transaction.observed.entry((E::TABLE, id)).or_insert(seen);
                change(&mut transaction.working)?;
                transaction.changes.push(Box::new(change));
                Ok(())
            }
            None => {
                let mut tables = self.database.tables.write().map_err(|_| SessionError::Poisoned)?;
                change(&mut tables)
            }
        }
    }
}
