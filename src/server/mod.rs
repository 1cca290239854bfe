use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower_http::services::ServeDir;

use crate::battle::archive::BattleArchive;
use crate::battle::ingest::load_battle_dir;
use crate::config::AppConfig;
use crate::data::loader::load_snapshot_or_empty;
use crate::data::store::NormalizedStore;

pub mod api;
pub mod routes;
pub mod sync;

pub const SYNC_TOKEN_HEADER: &str = "x-sync-token";

/// Shared server state. Queries take a read guard per request; only sync and battle ingest
/// take the write side. A handler that needs both locks takes the archive before the store.
#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<RwLock<NormalizedStore>>,
    pub archive: Arc<RwLock<BattleArchive>>,
    pub sync_token: Option<String>,
    /// Where sync writes the updated snapshot back to, when set.
    pub snapshot_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: NormalizedStore, archive: BattleArchive) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            archive: Arc::new(RwLock::new(archive)),
            sync_token: None,
            snapshot_path: None,
        }
    }

    /// Build state from config: snapshot (empty when missing) plus any battles on disk.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = load_snapshot_or_empty(&config.snapshot_path);
        let mut archive = BattleArchive::with_capacity(config.archive_capacity);
        if let Some(dir) = &config.battle_dir {
            for record in load_battle_dir(dir) {
                archive.insert(record);
            }
        }
        Self {
            sync_token: config.sync_token.clone(),
            snapshot_path: Some(config.snapshot_path.clone()),
            ..Self::new(store, archive)
        }
    }

    pub fn read_store(&self) -> RwLockReadGuard<'_, NormalizedStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write_store(&self) -> RwLockWriteGuard<'_, NormalizedStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read_archive(&self) -> RwLockReadGuard<'_, BattleArchive> {
        self.archive.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write_archive(&self) -> RwLockWriteGuard<'_, BattleArchive> {
        self.archive.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let token = headers
        .get(SYNC_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    let response = routes::route_request(method.as_str(), path, &body, token, &state);
    tracing::debug!(
        target: "fleetview::server",
        method = %method,
        path = %uri.path(),
        status = response.status_code,
        "request.handled"
    );
    response.into_response()
}

/// API routes dispatch through [routes::route_request]; everything else is served from
/// `static_dir` when one is configured.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api", any(dispatch))
        .route("/api/*rest", any(dispatch));
    let router = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.fallback(dispatch),
    };
    router.with_state(state)
}

pub async fn serve(config: &AppConfig, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        target: "fleetview::server",
        bind = %config.bind_addr,
        static_dir = ?config.static_dir,
        "server.listening"
    );
    axum::serve(listener, router(state, config.static_dir.as_deref())).await
}

pub fn run_server(config: &AppConfig) -> std::io::Result<()> {
    let state = AppState::from_config(config);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config, state))
}
