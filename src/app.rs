use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{JwtAccessGate, JwtSettings};
use crate::config::AppConfig;
use crate::database::{MemoryTodoStore, MemoryUserStore, TodoStore, UserStore};
use crate::handlers;
use crate::services::{TodoService, UserService};

/// Everything a handler needs, built once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub users: UserService,
}

impl AppState {
    pub fn new(todo_store: Arc<dyn TodoStore>, user_store: Arc<dyn UserStore>, config: &AppConfig) -> Self {
        let jwt = JwtSettings::from_config(&config.security);
        let gate = Arc::new(JwtAccessGate::new(jwt.clone()));

        Self {
            todos: TodoService::new(todo_store, gate),
            users: UserService::new(user_store, jwt, config.security.bcrypt_cost),
        }
    }

    /// State backed by in-process stores
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(MemoryTodoStore::new()),
            Arc::new(MemoryUserStore::new()),
            config,
        )
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
    }

    app
}

fn api_routes() -> Router<AppState> {
    use handlers::{todo, user};

    Router::new()
        // Collection
        .route("/todo", get(todo::todo_list).post(todo::todo_create))
        // Individual todo; DELETE is gated by the access token
        .route(
            "/todo/:todo_id",
            get(todo::todo_get)
                .patch(todo::todo_patch)
                .delete(todo::todo_delete),
        )
        .route("/user", get(user::list).post(user::register))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
