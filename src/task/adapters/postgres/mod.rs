//! `PostgreSQL` adapters for planning persistence.
//!
//! Every mutation runs in one transaction. Ordering writes first take
//! transaction-scoped advisory locks on the affected Gantt sequence and board
//! columns, then load a snapshot, plan the renumbering in the domain, and
//! write back only the rows whose positions changed. The dense-order unique
//! constraints are deferred to commit so intermediate states never collide.

mod conversion;
mod directory;
mod locks;
mod models;
mod schema;
mod store;
mod visibility;

use crate::task::ports::{TaskStoreError, TaskStoreResult};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::Clock;
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by planning adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store, directory and authorizer.
///
/// # Example
///
/// ```ignore
/// use diesel::r2d2::{ConnectionManager, Pool};
/// use diesel::PgConnection;
/// use mockable::DefaultClock;
/// use std::sync::Arc;
/// use taskboard::task::adapters::postgres::PostgresTaskStore;
///
/// let manager = ConnectionManager::<PgConnection>::new("postgres://...");
/// let pool = Pool::builder().build(manager).expect("pool");
/// let store = PostgresTaskStore::new(pool, Arc::new(DefaultClock));
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskStore<C> {
    pool: TaskPgPool,
    clock: Arc<C>,
}

impl<C> PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a store from a connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &TaskPgPool {
        &self.pool
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection, &C) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let clock = Arc::clone(&self.clock);
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection, clock.as_ref())
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

impl From<diesel::result::Error> for TaskStoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
