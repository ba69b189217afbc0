//! API application state, change publication, and health tracking.

use std::sync::{Arc, Mutex, MutexGuard};

use rackmap_events::{ChangeAction, Event, EventBus};
use rackmap_model::EntityKind;
use rackmap_registry::{Feature, FeatureQuery, FeatureRegistry, ModelKey, ModelPredicate};
use rackmap_search::SearchCatalog;
use rackmap_telemetry::Metrics;
use tracing::warn;
use uuid::Uuid;

use crate::facade::InventoryFacade;

pub(crate) struct ApiState {
    pub(crate) inventory: Arc<dyn InventoryFacade>,
    pub(crate) registry: Arc<FeatureRegistry>,
    pub(crate) catalog: Arc<SearchCatalog>,
    pub(crate) events: EventBus,
    pub(crate) telemetry: Metrics,
    webhook_models: ModelPredicate,
    health_status: Mutex<Vec<String>>,
}

impl ApiState {
    pub(crate) fn new(
        inventory: Arc<dyn InventoryFacade>,
        registry: Arc<FeatureRegistry>,
        catalog: Arc<SearchCatalog>,
        events: EventBus,
        telemetry: Metrics,
    ) -> Self {
        // The registry census is complete once the state is built, so the
        // webhook predicate can be resolved here instead of per publish.
        let webhook_models = FeatureQuery::new(Feature::Webhooks).resolve(&registry);
        Self {
            inventory,
            registry,
            catalog,
            events,
            telemetry,
            webhook_models,
            health_status: Mutex::new(Vec::new()),
        }
    }

    /// Emit a change-log event for a record, gated on the model being
    /// registered for the webhooks feature.
    pub(crate) fn publish_change(
        &self,
        action: ChangeAction,
        model: &ModelKey,
        object_id: Uuid,
        name: &str,
    ) {
        if !self.webhook_models.matches(model) {
            return;
        }
        let event = Event::ObjectChanged {
            action,
            app_label: model.app_label.clone(),
            model: model.model.clone(),
            object_id,
            name: name.to_string(),
        };
        self.telemetry.inc_event(event.kind());
        let _ = self.events.publish(event);
    }

    pub(crate) fn add_degraded_component(&self, component: &str) -> bool {
        let mut guard = Self::lock_guard(&self.health_status, "health_status");
        if guard.iter().any(|entry| entry == component) {
            return false;
        }
        guard.push(component.to_string());
        guard.sort();
        guard.dedup();
        let snapshot = guard.clone();
        drop(guard);
        let _ = self.events.publish(Event::HealthChanged { degraded: snapshot });
        true
    }

    pub(crate) fn remove_degraded_component(&self, component: &str) -> bool {
        let mut guard = Self::lock_guard(&self.health_status, "health_status");
        let previous = guard.len();
        guard.retain(|entry| entry != component);
        if guard.len() == previous {
            return false;
        }
        let snapshot = guard.clone();
        drop(guard);
        let _ = self.events.publish(Event::HealthChanged { degraded: snapshot });
        true
    }

    pub(crate) fn current_health_degraded(&self) -> Vec<String> {
        Self::lock_guard(&self.health_status, "health_status").clone()
    }

    /// Refresh the context/device gauges from the store.
    pub(crate) async fn refresh_inventory_gauges(&self) {
        match self.inventory.count_active_contexts().await {
            Ok(count) => self.telemetry.set_active_contexts(count),
            Err(err) => warn!(error = %err, "failed to refresh context gauge"),
        }
        match self.inventory.count_devices().await {
            Ok(count) => self.telemetry.set_active_devices(count),
            Err(err) => warn!(error = %err, "failed to refresh device gauge"),
        }
    }

    fn lock_guard<'a, T>(mutex: &'a Mutex<T>, name: &'a str) -> MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|err| {
            panic!("failed to lock {name}: {err}");
        })
    }
}

/// Model key for config contexts.
pub(crate) fn context_model() -> ModelKey {
    ModelKey::new("extras", "configcontext")
}

/// Model key for devices.
pub(crate) fn device_model() -> ModelKey {
    ModelKey::new("dcim", "device")
}

/// Model key for an organisational entity kind.
pub(crate) fn entity_model(kind: EntityKind) -> ModelKey {
    ModelKey::new(kind.app_label(), kind.as_str())
}
