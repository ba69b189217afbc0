//! Repository for config contexts and their scope assignments.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rackmap_model::{ConfigContext, ContextData, ContextSource, ScopeSet, TargetScope};
use rackmap_search::SearchHit;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Row, types::Json};
use uuid::Uuid;

use crate::error::{DataError, Result};

const INSERT_CONTEXT: &str = r"
    INSERT INTO config_context (id, name, weight, description, is_active, data)
    VALUES ($1, $2, $3, $4, $5, $6)
";

const UPDATE_CONTEXT: &str = r"
    UPDATE config_context
    SET name = $2,
        weight = $3,
        description = $4,
        is_active = $5,
        data = $6,
        updated_at = now()
    WHERE id = $1
";

const DELETE_CONTEXT: &str = r"DELETE FROM config_context WHERE id = $1";

const SELECT_CONTEXT: &str = r"
    SELECT id, name, weight, description, is_active, data
    FROM config_context
    WHERE id = $1
";

const SELECT_CONTEXTS: &str = r"
    SELECT id, name, weight, description, is_active, data
    FROM config_context
    ORDER BY weight, name
";

const COUNT_ACTIVE_CONTEXTS: &str = r"SELECT COUNT(*) FROM config_context WHERE is_active";

const SEARCH_CONTEXTS: &str = r"
    SELECT id, name
    FROM config_context
    WHERE name ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%'
    ORDER BY name
    LIMIT $2
";

// Each dimension admits a context when it is unscoped or intersects the
// target's attributes; an empty bind array can satisfy only the
// unscoped branch.
const MATCH_CONTEXTS: &str = r"
    SELECT c.id, c.name, c.weight, c.description, c.is_active, c.data
    FROM config_context c
    WHERE c.is_active
      AND (NOT EXISTS (SELECT 1 FROM config_context_regions j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_regions j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($1)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_site_groups j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_site_groups j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($2)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_sites j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_sites j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($3)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_device_types j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_device_types j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($4)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_roles j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_roles j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($5)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_platforms j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_platforms j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($6)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_cluster_types j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_cluster_types j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($7)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_cluster_groups j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_cluster_groups j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($8)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_clusters j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_clusters j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($9)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_tenant_groups j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_tenant_groups j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($10)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_tenants j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_tenants j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($11)))
      AND (NOT EXISTS (SELECT 1 FROM config_context_tags j WHERE j.context_id = c.id)
           OR EXISTS (SELECT 1 FROM config_context_tags j
                      WHERE j.context_id = c.id AND j.entity_id = ANY($12)))
    ORDER BY c.weight, c.name
";

const SELECT_SCOPES: &str = r"
    SELECT context_id, 'regions' AS dimension, entity_id
    FROM config_context_regions WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'site_groups', entity_id
    FROM config_context_site_groups WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'sites', entity_id
    FROM config_context_sites WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'device_types', entity_id
    FROM config_context_device_types WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'roles', entity_id
    FROM config_context_roles WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'platforms', entity_id
    FROM config_context_platforms WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'cluster_types', entity_id
    FROM config_context_cluster_types WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'cluster_groups', entity_id
    FROM config_context_cluster_groups WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'clusters', entity_id
    FROM config_context_clusters WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'tenant_groups', entity_id
    FROM config_context_tenant_groups WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'tenants', entity_id
    FROM config_context_tenants WHERE context_id = ANY($1)
    UNION ALL
    SELECT context_id, 'tags', entity_id
    FROM config_context_tags WHERE context_id = ANY($1)
";

/// Database-backed repository for config contexts.
#[derive(Clone)]
pub struct ContextStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct ContextRow {
    id: Uuid,
    name: String,
    weight: i32,
    description: String,
    is_active: bool,
    data: Json<Value>,
}

impl ContextStore {
    pub(crate) const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new context together with its scope assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; a duplicate name
    /// surfaces as a unique violation.
    pub async fn create(&self, context: &ConfigContext) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("context.create.begin"))?;

        sqlx::query(INSERT_CONTEXT)
            .bind(context.id)
            .bind(&context.name)
            .bind(context.weight)
            .bind(&context.description)
            .bind(context.is_active)
            .bind(Json(context.data.clone().into_value()))
            .execute(&mut *tx)
            .await
            .map_err(query_failed("context.create.insert"))?;

        insert_scope_rows(&mut tx, context.id, &context.scope).await?;

        tx.commit()
            .await
            .map_err(query_failed("context.create.commit"))?;
        Ok(())
    }

    /// Replace an existing context and its scope assignments.
    ///
    /// Returns `false` when no row matched the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub async fn update(&self, context: &ConfigContext) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("context.update.begin"))?;

        let updated = sqlx::query(UPDATE_CONTEXT)
            .bind(context.id)
            .bind(&context.name)
            .bind(context.weight)
            .bind(&context.description)
            .bind(context.is_active)
            .bind(Json(context.data.clone().into_value()))
            .execute(&mut *tx)
            .await
            .map_err(query_failed("context.update.row"))?;

        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        for (table, _) in scope_rows(&context.scope) {
            let sql = format!("DELETE FROM {table} WHERE context_id = $1");
            sqlx::query(sqlx::AssertSqlSafe(sql))
                .bind(context.id)
                .execute(&mut *tx)
                .await
                .map_err(query_failed("context.update.scope.clear"))?;
        }
        insert_scope_rows(&mut tx, context.id, &context.scope).await?;

        tx.commit()
            .await
            .map_err(query_failed("context.update.commit"))?;
        Ok(true)
    }

    /// Delete a context. Scope rows cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(DELETE_CONTEXT)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_failed("context.delete"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Load one context by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored document is
    /// malformed.
    pub async fn get(&self, id: Uuid) -> Result<Option<ConfigContext>> {
        let row = sqlx::query_as::<_, ContextRow>(SELECT_CONTEXT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("context.get"))?;

        match row {
            Some(row) => {
                let mut scopes = self.load_scopes(&[row.id]).await?;
                let scope = scopes.remove(&row.id).unwrap_or_default();
                Ok(Some(row_to_context(row, scope, "context.get")?))
            }
            None => Ok(None),
        }
    }

    /// Load every context, ordered by `(weight, name)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored document is
    /// malformed.
    pub async fn list(&self) -> Result<Vec<ConfigContext>> {
        let rows = sqlx::query_as::<_, ContextRow>(SELECT_CONTEXTS)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("context.list"))?;
        self.attach_scopes(rows, "context.list").await
    }

    /// Active contexts whose scope matches the target, ordered by
    /// `(weight, name)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored document is
    /// malformed.
    pub async fn contexts_for_target(&self, target: &TargetScope) -> Result<Vec<ConfigContext>> {
        let tags: Vec<Uuid> = target.tags.iter().copied().collect();
        let rows = sqlx::query_as::<_, ContextRow>(MATCH_CONTEXTS)
            .bind(&target.regions)
            .bind(&target.site_groups)
            .bind(option_values(target.site))
            .bind(option_values(target.device_type))
            .bind(option_values(target.role))
            .bind(option_values(target.platform))
            .bind(option_values(target.cluster_type))
            .bind(option_values(target.cluster_group))
            .bind(option_values(target.cluster))
            .bind(&target.tenant_groups)
            .bind(option_values(target.tenant))
            .bind(&tags)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("context.match"))?;
        self.attach_scopes(rows, "context.match").await
    }

    /// Name/description search for the global search surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(SEARCH_CONTEXTS)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("context.search"))?;

        rows.into_iter()
            .map(|row| {
                Ok(SearchHit {
                    object_id: row.try_get("id")?,
                    title: row.try_get("name")?,
                })
            })
            .collect()
    }

    /// Number of active contexts, for the telemetry gauge.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_active(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_ACTIVE_CONTEXTS)
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("context.count"))?;
        Ok(count)
    }

    async fn attach_scopes(
        &self,
        rows: Vec<ContextRow>,
        operation: &'static str,
    ) -> Result<Vec<ConfigContext>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut scopes = self.load_scopes(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let scope = scopes.remove(&row.id).unwrap_or_default();
                row_to_context(row, scope, operation)
            })
            .collect()
    }

    async fn load_scopes(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, ScopeSet>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(SELECT_SCOPES)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("context.scopes"))?;

        let mut scopes: HashMap<Uuid, ScopeSet> = HashMap::new();
        for row in rows {
            let context_id: Uuid = row.try_get("context_id")?;
            let dimension: String = row.try_get("dimension")?;
            let entity_id: Uuid = row.try_get("entity_id")?;
            let scope = scopes.entry(context_id).or_default();
            match scope_slot(scope, &dimension) {
                Some(slot) => {
                    slot.insert(entity_id);
                }
                None => {
                    tracing::warn!(dimension = %dimension, "unknown scope dimension row");
                }
            }
        }
        Ok(scopes)
    }
}

#[async_trait]
impl ContextSource for ContextStore {
    async fn contexts_for(&self, scope: &TargetScope) -> anyhow::Result<Vec<ConfigContext>> {
        Ok(self.contexts_for_target(scope).await?)
    }
}

async fn insert_scope_rows(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    context_id: Uuid,
    scope: &ScopeSet,
) -> Result<()> {
    for (table, values) in scope_rows(scope) {
        if values.is_empty() {
            continue;
        }
        let ids: Vec<Uuid> = values.iter().copied().collect();
        let sql = format!("INSERT INTO {table} (context_id, entity_id) SELECT $1, unnest($2::uuid[])");
        sqlx::query(sqlx::AssertSqlSafe(sql))
            .bind(context_id)
            .bind(&ids)
            .execute(&mut **tx)
            .await
            .map_err(query_failed("context.scope.insert"))?;
    }
    Ok(())
}

fn scope_rows(scope: &ScopeSet) -> [(&'static str, &BTreeSet<Uuid>); 12] {
    [
        ("config_context_regions", &scope.regions),
        ("config_context_site_groups", &scope.site_groups),
        ("config_context_sites", &scope.sites),
        ("config_context_device_types", &scope.device_types),
        ("config_context_roles", &scope.roles),
        ("config_context_platforms", &scope.platforms),
        ("config_context_cluster_types", &scope.cluster_types),
        ("config_context_cluster_groups", &scope.cluster_groups),
        ("config_context_clusters", &scope.clusters),
        ("config_context_tenant_groups", &scope.tenant_groups),
        ("config_context_tenants", &scope.tenants),
        ("config_context_tags", &scope.tags),
    ]
}

fn scope_slot<'a>(scope: &'a mut ScopeSet, dimension: &str) -> Option<&'a mut BTreeSet<Uuid>> {
    let slot = match dimension {
        "regions" => &mut scope.regions,
        "site_groups" => &mut scope.site_groups,
        "sites" => &mut scope.sites,
        "device_types" => &mut scope.device_types,
        "roles" => &mut scope.roles,
        "platforms" => &mut scope.platforms,
        "cluster_types" => &mut scope.cluster_types,
        "cluster_groups" => &mut scope.cluster_groups,
        "clusters" => &mut scope.clusters,
        "tenant_groups" => &mut scope.tenant_groups,
        "tenants" => &mut scope.tenants,
        "tags" => &mut scope.tags,
        _ => return None,
    };
    Some(slot)
}

fn option_values(value: Option<Uuid>) -> Vec<Uuid> {
    value.into_iter().collect()
}

fn row_to_context(
    row: ContextRow,
    scope: ScopeSet,
    operation: &'static str,
) -> Result<ConfigContext> {
    let data = ContextData::from_value(row.data.0, "data")
        .map_err(|source| DataError::InvalidDocument { operation, source })?;
    Ok(ConfigContext {
        id: row.id,
        name: row.name,
        weight: row.weight,
        description: row.description,
        is_active: row.is_active,
        scope,
        data,
    })
}

fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}
