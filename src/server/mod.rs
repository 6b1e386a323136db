//! HTTP server - axum router over the resolver, config store, and Docker
//! client.
//!
//! The local static routes (`/icons`, `/backgrounds`) are mounted only when
//! the storage strategy resolves to the local backend; under the object
//! store, references are fully qualified URLs and nothing is served from
//! here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, Paths, StorageStrategy};
use crate::configstore::ConfigStore;
use crate::discovery::{DiscoveryOptions, IconDiscovery};
use crate::docker::DockerClient;
use crate::resolver::IconResolver;
use crate::storage;

pub mod routes;

/// Shared, immutable per-process state. One resolver (holding the backend
/// client and HTTP client) and one Docker client serve all requests.
pub struct AppState {
    pub config_store: ConfigStore,
    pub resolver: IconResolver,
    pub docker: DockerClient,
}

pub fn build_state(config: &AppConfig, paths: &Paths) -> crate::Result<Arc<AppState>> {
    let store = storage::select_backend(config, paths);
    let discovery = IconDiscovery::new(paths.scratch_dir.clone(), DiscoveryOptions::default())?;
    let resolver = IconResolver::new(store, discovery, paths.scratch_dir.clone());
    let docker = DockerClient::new(config.docker_api_endpoint.clone())?;
    Ok(Arc::new(AppState {
        config_store: ConfigStore::new(paths),
        resolver,
        docker,
    }))
}

pub fn build_router(state: Arc<AppState>, config: &AppConfig, paths: &Paths) -> Router {
    let mut app = Router::new()
        .route("/api/settings", get(routes::get_settings))
        .route("/api/settings/background", post(routes::save_background))
        .route("/api/backgrounds", get(routes::list_backgrounds))
        .route("/api/backgrounds/upload", post(routes::upload_background))
        .route(
            "/api/services",
            get(routes::get_services).post(routes::save_services),
        )
        .route(
            "/api/bookmarks",
            get(routes::get_bookmarks).post(routes::save_bookmarks),
        )
        .route("/api/config", get(routes::get_overview))
        .route("/api/docker/containers", get(routes::list_containers))
        .route("/api/item/prepare", post(routes::prepare_item))
        .with_state(state);

    if serves_locally(config.icon_storage.strategy) {
        tracing::info!("local serving routes /icons and /backgrounds enabled");
        app = app
            .nest_service("/icons", ServeDir::new(&paths.icon_dir))
            .nest_service("/backgrounds", ServeDir::new(&paths.background_dir));
    } else {
        tracing::info!("local serving routes disabled; references point at the object store");
    }

    // Background images can be large; the 2 MB default is too small.
    app.layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Whether stored references resolve against this process. Unrecognized
/// strategies already fell back to the local backend.
fn serves_locally(strategy: StorageStrategy) -> bool {
    matches!(strategy, StorageStrategy::Local | StorageStrategy::Other)
}

pub async fn start_server(port: u16, config: AppConfig, paths: Paths) -> anyhow::Result<()> {
    paths.ensure_dirs()?;
    let state = build_state(&config, &paths)?;
    let app = build_router(state, &config, &paths);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_serving_condition() {
        assert!(serves_locally(StorageStrategy::Local));
        assert!(serves_locally(StorageStrategy::Other));
        assert!(!serves_locally(StorageStrategy::Minio));
    }

    #[test]
    fn test_router_builds_for_both_strategies() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::under(dir.path());

        for yaml in ["icon_storage:\n  strategy: local\n", "icon_storage:\n  strategy: minio\n"]
        {
            let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
            let state = build_state(&config, &paths).unwrap();
            let _router = build_router(state, &config, &paths);
        }
    }
}
