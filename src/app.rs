use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::IdentityProvider;
use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>, config: AppConfig) -> Self {
        Self {
            store,
            identity,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config);

    let protected_routes = Router::new()
        .merge(task_routes())
        .merge(contact_routes())
        .merge(sales_routes())
        .merge(dashboard_routes())
        .merge(analytics_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body)),
        )
        .with_state(state)
}

fn task_routes() -> Router<AppState> {
    use protected::tasks;

    Router::new()
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/:id",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
}

fn contact_routes() -> Router<AppState> {
    use protected::contacts;

    Router::new()
        .route("/api/contacts", get(contacts::list).post(contacts::create))
        .route(
            "/api/contacts/:id",
            get(contacts::get).put(contacts::update).delete(contacts::delete),
        )
}

fn sales_routes() -> Router<AppState> {
    use protected::sales;

    Router::new()
        .route("/api/sales-opportunities", get(sales::list).post(sales::create))
        .route(
            "/api/sales-opportunities/:id",
            get(sales::get).put(sales::update).delete(sales::delete),
        )
}

fn dashboard_routes() -> Router<AppState> {
    use protected::dashboard;

    Router::new()
        .route("/api/dashboard/summary", get(dashboard::summary))
        .route("/api/dashboard/total-counts", get(dashboard::total_counts))
        .route("/api/dashboard/recent-activity", get(dashboard::recent_activity))
        .route("/api/dashboard/upcoming-deadlines", get(dashboard::upcoming_deadlines))
        .route("/api/dashboard/tasks-summary/status", get(dashboard::tasks_by_status))
        .route("/api/dashboard/tasks-summary/priority", get(dashboard::tasks_by_priority))
        .route("/api/dashboard/contacts-summary", get(dashboard::contacts_summary))
}

fn analytics_routes() -> Router<AppState> {
    use protected::analytics;

    Router::new()
        .route("/api/analytics", get(analytics::combined))
        .route("/api/analytics/sales-by-date-range", get(analytics::sales_by_date_range))
        .route("/api/analytics/sales-pipeline-summary", get(analytics::sales_pipeline_summary))
}

/// Permissive when no origins are configured (development), otherwise an allow-list
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
