//! Inventory facade the HTTP layer is written against.
//!
//! The production implementation delegates to the sqlx repositories;
//! tests substitute an in-memory store.

use async_trait::async_trait;
use uuid::Uuid;

use rackmap_data::DataServices;
use rackmap_model::{ConfigContext, Device, Entity, EntityKind, TargetScope};
use rackmap_search::SearchHit;

/// Storage operations the API handlers depend on.
#[async_trait]
pub trait InventoryFacade: Send + Sync {
    /// Persist a new config context.
    async fn create_context(&self, context: ConfigContext) -> anyhow::Result<()>;
    /// Replace an existing config context; false when the id is unknown.
    async fn update_context(&self, context: ConfigContext) -> anyhow::Result<bool>;
    /// Delete a config context, returning the prior record when found.
    async fn delete_context(&self, id: Uuid) -> anyhow::Result<Option<ConfigContext>>;
    /// Load one config context.
    async fn get_context(&self, id: Uuid) -> anyhow::Result<Option<ConfigContext>>;
    /// Load every config context, in `(weight, name)` order.
    async fn list_contexts(&self) -> anyhow::Result<Vec<ConfigContext>>;
    /// Active contexts matching a target scope, in `(weight, name)` order.
    async fn contexts_for_target(&self, scope: &TargetScope) -> anyhow::Result<Vec<ConfigContext>>;

    /// Insert or replace a device record.
    async fn upsert_device(&self, device: Device) -> anyhow::Result<()>;
    /// Delete a device record, returning the prior record when found.
    async fn delete_device(&self, id: Uuid) -> anyhow::Result<Option<Device>>;
    /// Load one device record.
    async fn get_device(&self, id: Uuid) -> anyhow::Result<Option<Device>>;
    /// Load every device record, ordered by name.
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>>;

    /// Persist a new organisational entity.
    async fn create_entity(&self, entity: Entity) -> anyhow::Result<()>;
    /// Delete an organisational entity.
    async fn delete_entity(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Load one organisational entity.
    async fn get_entity(&self, id: Uuid) -> anyhow::Result<Option<Entity>>;
    /// Load every entity of a kind, ordered by name.
    async fn list_entities(&self, kind: EntityKind) -> anyhow::Result<Vec<Entity>>;

    /// Dispatch a search for one catalogue type; `None` when the type
    /// has no backing repository.
    async fn search(
        &self,
        type_name: &str,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Option<Vec<SearchHit>>>;

    /// Active config context count, for the telemetry gauge.
    async fn count_active_contexts(&self) -> anyhow::Result<i64>;
    /// Device record count, for the telemetry gauge.
    async fn count_devices(&self) -> anyhow::Result<i64>;
    /// Storage liveness probe.
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl InventoryFacade for DataServices {
    async fn create_context(&self, context: ConfigContext) -> anyhow::Result<()> {
        self.contexts().create(&context).await?;
        Ok(())
    }

    async fn update_context(&self, context: ConfigContext) -> anyhow::Result<bool> {
        Ok(self.contexts().update(&context).await?)
    }

    async fn delete_context(&self, id: Uuid) -> anyhow::Result<Option<ConfigContext>> {
        let Some(existing) = self.contexts().get(id).await? else {
            return Ok(None);
        };
        self.contexts().delete(id).await?;
        Ok(Some(existing))
    }

    async fn get_context(&self, id: Uuid) -> anyhow::Result<Option<ConfigContext>> {
        Ok(self.contexts().get(id).await?)
    }

    async fn list_contexts(&self) -> anyhow::Result<Vec<ConfigContext>> {
        Ok(self.contexts().list().await?)
    }

    async fn contexts_for_target(&self, scope: &TargetScope) -> anyhow::Result<Vec<ConfigContext>> {
        Ok(self.contexts().contexts_for_target(scope).await?)
    }

    async fn upsert_device(&self, device: Device) -> anyhow::Result<()> {
        self.devices().upsert(&device).await?;
        Ok(())
    }

    async fn delete_device(&self, id: Uuid) -> anyhow::Result<Option<Device>> {
        let Some(existing) = self.devices().get(id).await? else {
            return Ok(None);
        };
        self.devices().delete(id).await?;
        Ok(Some(existing))
    }

    async fn get_device(&self, id: Uuid) -> anyhow::Result<Option<Device>> {
        Ok(self.devices().get(id).await?)
    }

    async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        Ok(self.devices().list().await?)
    }

    async fn create_entity(&self, entity: Entity) -> anyhow::Result<()> {
        self.entities().create(&entity).await?;
        Ok(())
    }

    async fn delete_entity(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.entities().delete(id).await?)
    }

    async fn get_entity(&self, id: Uuid) -> anyhow::Result<Option<Entity>> {
        Ok(self.entities().get(id).await?)
    }

    async fn list_entities(&self, kind: EntityKind) -> anyhow::Result<Vec<Entity>> {
        Ok(self.entities().list(kind).await?)
    }

    async fn search(
        &self,
        type_name: &str,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Option<Vec<SearchHit>>> {
        Ok(Self::search(self, type_name, query, limit).await?)
    }

    async fn count_active_contexts(&self) -> anyhow::Result<i64> {
        Ok(self.contexts().count_active().await?)
    }

    async fn count_devices(&self) -> anyhow::Result<i64> {
        Ok(self.devices().count().await?)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(Self::ping(self).await?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use rackmap_model::render_for_target;

    /// In-memory facade used by handler tests.
    #[derive(Default)]
    pub(crate) struct MemoryInventory {
        pub(crate) contexts: Mutex<HashMap<Uuid, ConfigContext>>,
        pub(crate) devices: Mutex<HashMap<Uuid, Device>>,
        pub(crate) entities: Mutex<HashMap<Uuid, Entity>>,
    }

    impl MemoryInventory {
        fn duplicate_context_name(&self, context: &ConfigContext) -> bool {
            self.contexts
                .lock()
                .unwrap()
                .values()
                .any(|existing| existing.name == context.name && existing.id != context.id)
        }
    }

    #[async_trait]
    impl InventoryFacade for MemoryInventory {
        async fn create_context(&self, context: ConfigContext) -> anyhow::Result<()> {
            if self.duplicate_context_name(&context) {
                anyhow::bail!("duplicate context name");
            }
            self.contexts.lock().unwrap().insert(context.id, context);
            Ok(())
        }

        async fn update_context(&self, context: ConfigContext) -> anyhow::Result<bool> {
            let mut guard = self.contexts.lock().unwrap();
            if !guard.contains_key(&context.id) {
                return Ok(false);
            }
            guard.insert(context.id, context);
            Ok(true)
        }

        async fn delete_context(&self, id: Uuid) -> anyhow::Result<Option<ConfigContext>> {
            Ok(self.contexts.lock().unwrap().remove(&id))
        }

        async fn get_context(&self, id: Uuid) -> anyhow::Result<Option<ConfigContext>> {
            Ok(self.contexts.lock().unwrap().get(&id).cloned())
        }

        async fn list_contexts(&self) -> anyhow::Result<Vec<ConfigContext>> {
            let mut contexts: Vec<ConfigContext> =
                self.contexts.lock().unwrap().values().cloned().collect();
            contexts.sort_by(|a, b| a.resolution_key().cmp(&b.resolution_key()));
            Ok(contexts)
        }

        async fn contexts_for_target(
            &self,
            scope: &TargetScope,
        ) -> anyhow::Result<Vec<ConfigContext>> {
            let mut contexts: Vec<ConfigContext> = self
                .contexts
                .lock()
                .unwrap()
                .values()
                .filter(|context| context.applies_to(scope))
                .cloned()
                .collect();
            contexts.sort_by(|a, b| a.resolution_key().cmp(&b.resolution_key()));
            Ok(contexts)
        }

        async fn upsert_device(&self, device: Device) -> anyhow::Result<()> {
            self.devices.lock().unwrap().insert(device.id, device);
            Ok(())
        }

        async fn delete_device(&self, id: Uuid) -> anyhow::Result<Option<Device>> {
            Ok(self.devices.lock().unwrap().remove(&id))
        }

        async fn get_device(&self, id: Uuid) -> anyhow::Result<Option<Device>> {
            Ok(self.devices.lock().unwrap().get(&id).cloned())
        }

        async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
            let mut devices: Vec<Device> =
                self.devices.lock().unwrap().values().cloned().collect();
            devices.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(devices)
        }

        async fn create_entity(&self, entity: Entity) -> anyhow::Result<()> {
            self.entities.lock().unwrap().insert(entity.id, entity);
            Ok(())
        }

        async fn delete_entity(&self, id: Uuid) -> anyhow::Result<bool> {
            Ok(self.entities.lock().unwrap().remove(&id).is_some())
        }

        async fn get_entity(&self, id: Uuid) -> anyhow::Result<Option<Entity>> {
            Ok(self.entities.lock().unwrap().get(&id).cloned())
        }

        async fn list_entities(&self, kind: EntityKind) -> anyhow::Result<Vec<Entity>> {
            let mut entities: Vec<Entity> = self
                .entities
                .lock()
                .unwrap()
                .values()
                .filter(|entity| entity.kind == kind)
                .cloned()
                .collect();
            entities.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entities)
        }

        async fn search(
            &self,
            type_name: &str,
            query: &str,
            limit: usize,
        ) -> anyhow::Result<Option<Vec<SearchHit>>> {
            let needle = query.to_lowercase();
            if let Ok(kind) = type_name.parse::<EntityKind>() {
                let mut hits: Vec<SearchHit> = self
                    .entities
                    .lock()
                    .unwrap()
                    .values()
                    .filter(|entity| {
                        entity.kind == kind && entity.name.to_lowercase().contains(&needle)
                    })
                    .map(|entity| SearchHit {
                        object_id: entity.id,
                        title: entity.name.clone(),
                    })
                    .collect();
                hits.sort_by(|a, b| a.title.cmp(&b.title));
                hits.truncate(limit);
                return Ok(Some(hits));
            }
            match type_name {
                "device" => {
                    let mut hits: Vec<SearchHit> = self
                        .devices
                        .lock()
                        .unwrap()
                        .values()
                        .filter(|device| device.name.to_lowercase().contains(&needle))
                        .map(|device| SearchHit {
                            object_id: device.id,
                            title: device.name.clone(),
                        })
                        .collect();
                    hits.sort_by(|a, b| a.title.cmp(&b.title));
                    hits.truncate(limit);
                    Ok(Some(hits))
                }
                "configcontext" => {
                    let mut hits: Vec<SearchHit> = self
                        .contexts
                        .lock()
                        .unwrap()
                        .values()
                        .filter(|context| context.name.to_lowercase().contains(&needle))
                        .map(|context| SearchHit {
                            object_id: context.id,
                            title: context.name.clone(),
                        })
                        .collect();
                    hits.sort_by(|a, b| a.title.cmp(&b.title));
                    hits.truncate(limit);
                    Ok(Some(hits))
                }
                _ => Ok(None),
            }
        }

        async fn count_active_contexts(&self) -> anyhow::Result<i64> {
            let count = self
                .contexts
                .lock()
                .unwrap()
                .values()
                .filter(|context| context.is_active)
                .count();
            Ok(i64::try_from(count).unwrap_or(i64::MAX))
        }

        async fn count_devices(&self) -> anyhow::Result<i64> {
            let count = self.devices.lock().unwrap().len();
            Ok(i64::try_from(count).unwrap_or(i64::MAX))
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn memory_inventory_matches_and_renders() {
        let inventory = MemoryInventory::default();
        let context = ConfigContext::new(
            "base",
            1000,
            rackmap_model::ContextData::from_value(serde_json::json!({"a": 1}), "data").unwrap(),
        )
        .unwrap();
        inventory.create_context(context).await.unwrap();

        let device = Device {
            id: Uuid::new_v4(),
            name: "edge-router".to_string(),
            scope: TargetScope::default(),
            local_context_data: None,
        };
        let matching = inventory
            .contexts_for_target(&device.scope)
            .await
            .unwrap();
        let rendered = render_for_target(&matching, &device);
        assert_eq!(rendered.into_value(), serde_json::json!({"a": 1}));
    }
}
