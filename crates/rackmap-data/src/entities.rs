//! Repository for organisational entities (sites, tenants, tags, ...).

use rackmap_model::{Entity, EntityKind};
use rackmap_search::SearchHit;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::error::{DataError, Result};

const INSERT_ENTITY: &str = r"
    INSERT INTO org_entity (id, kind, name, slug)
    VALUES ($1, $2, $3, $4)
";

const DELETE_ENTITY: &str = r"DELETE FROM org_entity WHERE id = $1";

const SELECT_ENTITY: &str = r"
    SELECT id, kind, name, slug FROM org_entity WHERE id = $1
";

const SELECT_ENTITIES_BY_KIND: &str = r"
    SELECT id, kind, name, slug
    FROM org_entity
    WHERE kind = $1
    ORDER BY name
";

const SEARCH_ENTITIES: &str = r"
    SELECT id, name
    FROM org_entity
    WHERE kind = $1 AND (name ILIKE '%' || $2 || '%' OR slug ILIKE '%' || $2 || '%')
    ORDER BY name
    LIMIT $3
";

/// Database-backed repository for organisational entities.
#[derive(Clone)]
pub struct EntityStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct EntityRow {
    id: Uuid,
    kind: String,
    name: String,
    slug: String,
}

impl EntityStore {
    pub(crate) const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails; a duplicate (kind, slug)
    /// surfaces as a unique violation.
    pub async fn create(&self, entity: &Entity) -> Result<()> {
        sqlx::query(INSERT_ENTITY)
            .bind(entity.id)
            .bind(entity.kind.as_str())
            .bind(&entity.name)
            .bind(&entity.slug)
            .execute(&self.pool)
            .await
            .map_err(query_failed("entity.create"))?;
        Ok(())
    }

    /// Delete an entity. Join rows referencing it cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(DELETE_ENTITY)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_failed("entity.delete"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Load one entity by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored kind label is
    /// unknown.
    pub async fn get(&self, id: Uuid) -> Result<Option<Entity>> {
        let row = sqlx::query_as::<_, EntityRow>(SELECT_ENTITY)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("entity.get"))?;
        row.map(|row| row_to_entity(row, "entity.get")).transpose()
    }

    /// Load every entity of a kind, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        let rows = sqlx::query_as::<_, EntityRow>(SELECT_ENTITIES_BY_KIND)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("entity.list"))?;
        rows.into_iter()
            .map(|row| row_to_entity(row, "entity.list"))
            .collect()
    }

    /// Name/slug search for the global search surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search(
        &self,
        kind: EntityKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(SEARCH_ENTITIES)
            .bind(kind.as_str())
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("entity.search"))?;

        rows.into_iter()
            .map(|row| {
                Ok(SearchHit {
                    object_id: row.try_get("id")?,
                    title: row.try_get("name")?,
                })
            })
            .collect()
    }
}

fn row_to_entity(row: EntityRow, operation: &'static str) -> Result<Entity> {
    let kind = row
        .kind
        .parse::<EntityKind>()
        .map_err(|source| DataError::InvalidDocument { operation, source })?;
    Ok(Entity {
        id: row.id,
        kind,
        name: row.name,
        slug: row.slug,
    })
}

fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_with_unknown_kind_are_rejected() {
        let row = EntityRow {
            id: Uuid::new_v4(),
            kind: "floorplan".to_string(),
            name: "Basement".to_string(),
            slug: "basement".to_string(),
        };
        let err = row_to_entity(row, "test").unwrap_err();
        assert!(matches!(err, DataError::InvalidDocument { .. }));
    }

    #[test]
    fn rows_round_trip_into_entities() {
        let id = Uuid::new_v4();
        let row = EntityRow {
            id,
            kind: "site".to_string(),
            name: "Frankfurt 1".to_string(),
            slug: "fra1".to_string(),
        };
        let entity = row_to_entity(row, "test").unwrap();
        assert_eq!(entity.id, id);
        assert_eq!(entity.kind, EntityKind::Site);
    }
}
