#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! PostgreSQL persistence for Rackmap: migrations and repositories for
//! config contexts, devices, and organisational entities.

pub mod contexts;
pub mod devices;
pub mod entities;
pub mod error;

use rackmap_model::EntityKind;
use rackmap_search::SearchHit;
use sqlx::PgPool;

pub use contexts::ContextStore;
pub use devices::DeviceStore;
pub use entities::EntityStore;
pub use error::{DataError, Result as DataResult};

use error::Result;

/// Aggregate handle over the repositories sharing one connection pool.
#[derive(Clone)]
pub struct DataServices {
    pool: PgPool,
    contexts: ContextStore,
    devices: DeviceStore,
    entities: EntityStore,
}

impl DataServices {
    /// Initialise the data layer, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail or the database is
    /// unreachable.
    pub async fn new(pool: PgPool) -> Result<Self> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator
            .run(&pool)
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;

        Ok(Self {
            contexts: ContextStore::new(pool.clone()),
            devices: DeviceStore::new(pool.clone()),
            entities: EntityStore::new(pool.clone()),
            pool,
        })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Config context repository.
    #[must_use]
    pub const fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Device repository.
    #[must_use]
    pub const fn devices(&self) -> &DeviceStore {
        &self.devices
    }

    /// Organisational entity repository.
    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Liveness probe used by the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not answer.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::QueryFailed {
                operation: "ping",
                source,
            })?;
        Ok(())
    }

    /// Dispatch a global-search query for one catalogue type.
    ///
    /// Returns `None` when the type name has no backing repository, so
    /// the caller can skip it rather than report an empty result.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub async fn search(
        &self,
        type_name: &str,
        query: &str,
        limit: usize,
    ) -> Result<Option<Vec<SearchHit>>> {
        if let Ok(kind) = type_name.parse::<EntityKind>() {
            return Ok(Some(self.entities.search(kind, query, limit).await?));
        }
        match type_name {
            "device" => Ok(Some(self.devices.search(query, limit).await?)),
            "configcontext" => Ok(Some(self.contexts.search(query, limit).await?)),
            _ => Ok(None),
        }
    }
}
