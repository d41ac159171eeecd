use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use room_core::UsersLimits;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod repository;
pub mod service;
pub mod telemetry;

use handlers::{rooms, users};
use repository::InMemoryStore;
use service::RoomService;

#[derive(Clone)]
pub struct AppState {
    service: RoomService,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_store(InMemoryStore::new(), UsersLimits::default())
    }
}

impl AppState {
    pub fn from_store(store: InMemoryStore, limits: UsersLimits) -> Self {
        let store = Arc::new(store);
        Self {
            service: RoomService::new(store.clone(), store, limits),
        }
    }

    pub async fn with_persistence(
        path: impl Into<PathBuf>,
        limits: UsersLimits,
    ) -> repository::StoreResult<Self> {
        let store = InMemoryStore::with_persistence(path).await?;
        Ok(Self::from_store(store, limits))
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/rooms",
            post(rooms::create_room)
                .get(rooms::get_room)
                .patch(rooms::update_room),
        )
        .route("/api/rooms/draw", post(rooms::draw_room))
        .route("/api/users", get(users::list_users).post(users::join_room))
        .route(
            "/api/users/:id",
            get(users::get_user).delete(users::delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the web client. Without a configured origin any origin is allowed.
pub fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}
