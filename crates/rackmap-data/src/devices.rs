//! Repository for device records.

use std::collections::{BTreeSet, HashMap};

use rackmap_model::{ContextData, Device, TargetScope};
use rackmap_search::SearchHit;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Row, types::Json};
use uuid::Uuid;

use crate::error::{DataError, Result};

const UPSERT_DEVICE: &str = r"
    INSERT INTO device (
        id, name, region_ids, site_group_ids, site_id, device_type_id,
        role_id, platform_id, cluster_type_id, cluster_group_id,
        cluster_id, tenant_group_ids, tenant_id, local_context_data
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    ON CONFLICT (id) DO UPDATE SET
        name = EXCLUDED.name,
        region_ids = EXCLUDED.region_ids,
        site_group_ids = EXCLUDED.site_group_ids,
        site_id = EXCLUDED.site_id,
        device_type_id = EXCLUDED.device_type_id,
        role_id = EXCLUDED.role_id,
        platform_id = EXCLUDED.platform_id,
        cluster_type_id = EXCLUDED.cluster_type_id,
        cluster_group_id = EXCLUDED.cluster_group_id,
        cluster_id = EXCLUDED.cluster_id,
        tenant_group_ids = EXCLUDED.tenant_group_ids,
        tenant_id = EXCLUDED.tenant_id,
        local_context_data = EXCLUDED.local_context_data,
        updated_at = now()
";

const DELETE_DEVICE: &str = r"DELETE FROM device WHERE id = $1";

const SELECT_DEVICE: &str = r"
    SELECT id, name, region_ids, site_group_ids, site_id, device_type_id,
           role_id, platform_id, cluster_type_id, cluster_group_id,
           cluster_id, tenant_group_ids, tenant_id, local_context_data
    FROM device
    WHERE id = $1
";

const SELECT_DEVICES: &str = r"
    SELECT id, name, region_ids, site_group_ids, site_id, device_type_id,
           role_id, platform_id, cluster_type_id, cluster_group_id,
           cluster_id, tenant_group_ids, tenant_id, local_context_data
    FROM device
    ORDER BY name
";

const CLEAR_DEVICE_TAGS: &str = r"DELETE FROM device_tag WHERE device_id = $1";

const INSERT_DEVICE_TAGS: &str = r"
    INSERT INTO device_tag (device_id, tag_id)
    SELECT $1, unnest($2::uuid[])
";

const SELECT_DEVICE_TAGS: &str = r"
    SELECT device_id, tag_id FROM device_tag WHERE device_id = ANY($1)
";

const SEARCH_DEVICES: &str = r"
    SELECT id, name
    FROM device
    WHERE name ILIKE '%' || $1 || '%'
    ORDER BY name
    LIMIT $2
";

const COUNT_DEVICES: &str = r"SELECT COUNT(*) FROM device";

/// Database-backed repository for devices.
#[derive(Clone)]
pub struct DeviceStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DeviceRow {
    id: Uuid,
    name: String,
    region_ids: Vec<Uuid>,
    site_group_ids: Vec<Uuid>,
    site_id: Option<Uuid>,
    device_type_id: Option<Uuid>,
    role_id: Option<Uuid>,
    platform_id: Option<Uuid>,
    cluster_type_id: Option<Uuid>,
    cluster_group_id: Option<Uuid>,
    cluster_id: Option<Uuid>,
    tenant_group_ids: Vec<Uuid>,
    tenant_id: Option<Uuid>,
    local_context_data: Option<Json<Value>>,
}

impl DeviceStore {
    pub(crate) const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a device record and its tag assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; a duplicate name
    /// surfaces as a unique violation.
    pub async fn upsert(&self, device: &Device) -> Result<()> {
        let local = device
            .local_context_data
            .as_ref()
            .map(|data| Json(data.clone().into_value()));

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("device.upsert.begin"))?;

        sqlx::query(UPSERT_DEVICE)
            .bind(device.id)
            .bind(&device.name)
            .bind(&device.scope.regions)
            .bind(&device.scope.site_groups)
            .bind(device.scope.site)
            .bind(device.scope.device_type)
            .bind(device.scope.role)
            .bind(device.scope.platform)
            .bind(device.scope.cluster_type)
            .bind(device.scope.cluster_group)
            .bind(device.scope.cluster)
            .bind(&device.scope.tenant_groups)
            .bind(device.scope.tenant)
            .bind(local)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("device.upsert.row"))?;

        sqlx::query(CLEAR_DEVICE_TAGS)
            .bind(device.id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("device.upsert.tags.clear"))?;

        if !device.scope.tags.is_empty() {
            let tags: Vec<Uuid> = device.scope.tags.iter().copied().collect();
            sqlx::query(INSERT_DEVICE_TAGS)
                .bind(device.id)
                .bind(&tags)
                .execute(&mut *tx)
                .await
                .map_err(query_failed("device.upsert.tags.insert"))?;
        }

        tx.commit()
            .await
            .map_err(query_failed("device.upsert.commit"))?;
        Ok(())
    }

    /// Delete a device record. Tag rows cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(DELETE_DEVICE)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_failed("device.delete"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Load one device by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored local context
    /// document is malformed.
    pub async fn get(&self, id: Uuid) -> Result<Option<Device>> {
        let row = sqlx::query_as::<_, DeviceRow>(SELECT_DEVICE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("device.get"))?;

        match row {
            Some(row) => {
                let mut tags = self.load_tags(&[row.id]).await?;
                let tag_set = tags.remove(&row.id).unwrap_or_default();
                Ok(Some(row_to_device(row, tag_set, "device.get")?))
            }
            None => Ok(None),
        }
    }

    /// Load every device, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored document is
    /// malformed.
    pub async fn list(&self) -> Result<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceRow>(SELECT_DEVICES)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("device.list"))?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut tags = self.load_tags(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let tag_set = tags.remove(&row.id).unwrap_or_default();
                row_to_device(row, tag_set, "device.list")
            })
            .collect()
    }

    /// Name search for the global search surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(SEARCH_DEVICES)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("device.search"))?;

        rows.into_iter()
            .map(|row| {
                Ok(SearchHit {
                    object_id: row.try_get("id")?,
                    title: row.try_get("name")?,
                })
            })
            .collect()
    }

    /// Number of device records, for the telemetry gauge.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_DEVICES)
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("device.count"))?;
        Ok(count)
    }

    async fn load_tags(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, BTreeSet<Uuid>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(SELECT_DEVICE_TAGS)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("device.tags"))?;

        let mut tags: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for row in rows {
            let device_id: Uuid = row.try_get("device_id")?;
            let tag_id: Uuid = row.try_get("tag_id")?;
            tags.entry(device_id).or_default().insert(tag_id);
        }
        Ok(tags)
    }
}

fn row_to_device(
    row: DeviceRow,
    tags: BTreeSet<Uuid>,
    operation: &'static str,
) -> Result<Device> {
    let local_context_data = row
        .local_context_data
        .map(|Json(value)| {
            ContextData::from_value(value, "local_context_data")
                .map_err(|source| DataError::InvalidDocument { operation, source })
        })
        .transpose()?;

    Ok(Device {
        id: row.id,
        name: row.name,
        scope: TargetScope {
            regions: row.region_ids,
            site_groups: row.site_group_ids,
            site: row.site_id,
            device_type: row.device_type_id,
            role: row.role_id,
            platform: row.platform_id,
            cluster_type: row.cluster_type_id,
            cluster_group: row.cluster_group_id,
            cluster: row.cluster_id,
            tenant_groups: row.tenant_group_ids,
            tenant: row.tenant_id,
            tags,
        },
        local_context_data,
    })
}

fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}
