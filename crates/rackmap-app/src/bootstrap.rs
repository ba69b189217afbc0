//! Application bootstrap and environment loading.

use std::net::SocketAddr;
use std::sync::Arc;

use rackmap_api::{ApiServer, InventoryFacade};
use rackmap_data::{DataError, DataServices};
use rackmap_events::EventBus;
use rackmap_model::EntityKind;
use rackmap_registry::{FeatureRegistry, ModelKey};
use rackmap_search::SearchCatalog;
use rackmap_telemetry::{LoggingConfig, Metrics};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{AppError, AppResult};

const DEFAULT_BIND: &str = "127.0.0.1:8640";
const MAX_POOL_CONNECTIONS: u32 = 16;

/// Dependencies required to bootstrap the Rackmap application.
#[derive(Debug)]
pub(crate) struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    bind_addr: SocketAddr,
    database_url: String,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| AppError::MissingEnv {
            name: "DATABASE_URL",
        })?;

        let bind_value =
            std::env::var("RACKMAP_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr = bind_value
            .parse::<SocketAddr>()
            .map_err(|_| AppError::InvalidConfig {
                field: "RACKMAP_BIND",
                reason: "must be a socket address",
                value: Some(bind_value),
            })?;

        Ok(Self {
            logging: LoggingConfig::default(),
            bind_addr,
            database_url,
        })
    }
}

/// Entry point for the Rackmap application boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or application startup
/// fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    rackmap_telemetry::init_logging(&dependencies.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!("Rackmap application bootstrap starting");

    let telemetry = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

    let pool = PgPoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .connect(&dependencies.database_url)
        .await
        .map_err(|source| AppError::data("pool.connect", DataError::from(source)))?;

    let data = DataServices::new(pool)
        .await
        .map_err(|source| AppError::data("data.migrate", source))?;
    info!("database migrations applied");

    let registry = Arc::new(build_feature_registry()?);
    let catalog = Arc::new(SearchCatalog::builtin());
    let events = EventBus::new();

    let inventory: Arc<dyn InventoryFacade> = Arc::new(data);
    let server = ApiServer::new(inventory, registry, catalog, events, telemetry);

    let listener = TcpListener::bind(dependencies.bind_addr)
        .await
        .map_err(|source| AppError::Io {
            operation: "listener.bind",
            source,
        })?;
    info!(addr = %dependencies.bind_addr, "Rackmap API listening");

    tokio::select! {
        result = server.serve(listener) => {
            result.map_err(|err| AppError::api_server("api.serve", err))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    }
}

/// The model census: every model that opts into cross-cutting features,
/// registered before the API state snapshots the webhook predicate.
pub(crate) fn build_feature_registry() -> AppResult<FeatureRegistry> {
    let mut registry = FeatureRegistry::new();

    let census: &[(ModelKey, &[&str])] = &[
        (
            ModelKey::new("extras", "configcontext"),
            &["export_templates", "webhooks"],
        ),
        (
            ModelKey::new("dcim", "device"),
            &[
                "custom_fields",
                "custom_links",
                "export_templates",
                "journaling",
                "tags",
                "webhooks",
            ],
        ),
        (
            entity_key(EntityKind::Region),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::SiteGroup),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::Site),
            &["custom_fields", "export_templates", "tags", "webhooks"],
        ),
        (
            entity_key(EntityKind::DeviceType),
            &["custom_fields", "export_templates", "tags", "webhooks"],
        ),
        (
            entity_key(EntityKind::DeviceRole),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::Platform),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::ClusterType),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::ClusterGroup),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::Cluster),
            &["custom_fields", "export_templates", "tags", "webhooks"],
        ),
        (
            entity_key(EntityKind::TenantGroup),
            &["custom_fields", "export_templates", "webhooks"],
        ),
        (
            entity_key(EntityKind::Tenant),
            &["custom_fields", "export_templates", "tags", "webhooks"],
        ),
        (entity_key(EntityKind::Tag), &["export_templates", "webhooks"]),
    ];

    for (model, features) in census {
        registry
            .register(model, features)
            .map_err(|source| AppError::Registry { source })?;
    }
    Ok(registry)
}

fn entity_key(kind: EntityKind) -> ModelKey {
    ModelKey::new(kind.app_label(), kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackmap_registry::Feature;

    #[test]
    fn census_registers_the_expected_buckets() {
        let registry = build_feature_registry().expect("census must register cleanly");

        let device = ModelKey::new("dcim", "device");
        assert!(registry.supports(Feature::Tags, &device));
        assert!(registry.supports(Feature::Webhooks, &device));

        let context = ModelKey::new("extras", "configcontext");
        assert!(registry.supports(Feature::Webhooks, &context));
        assert!(!registry.supports(Feature::Tags, &context));

        // Every entity kind is change-logged.
        for kind in EntityKind::ALL {
            assert!(registry.supports(Feature::Webhooks, &entity_key(kind)));
        }

        // Group-style models do not carry tags.
        assert!(!registry.supports(Feature::Tags, &entity_key(EntityKind::Region)));
        assert!(registry.supports(Feature::Tags, &entity_key(EntityKind::Site)));
    }

    #[test]
    fn missing_database_url_is_reported() {
        // The variable may be present in CI; only assert the error shape
        // when it is absent.
        if std::env::var("DATABASE_URL").is_err() {
            let err = BootstrapDependencies::from_env().unwrap_err();
            assert!(matches!(err, AppError::MissingEnv { name: "DATABASE_URL" }));
        }
    }
}
