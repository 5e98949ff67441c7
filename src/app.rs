use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put, MethodRouter},
    Extension, Router,
};
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::RoleSet;
use crate::database::models::ReferenceTable;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{expose_error_detail, jwt_auth_middleware, require_role};
use crate::state::AppState;

/// Complete HTTP application: public routes, JWT-protected routes and the
/// global middleware stack.
pub fn app(state: AppState) -> Router {
    let expose_detail = !state.config.is_production();
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Public auth routes
        .route("/login", post(public::login_post))
        .route("/register", post(public::register_post))
        // Protected API
        .merge(protected_routes(state.clone()))
        .fallback(public::route_not_found)
        // Global middleware
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(expose_detail, expose_error_detail))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(session_routes())
        .merge(worker_routes())
        .merge(history_routes("/list"))
        .merge(history_routes("/history"))
        .merge(reference_routes())
        // Authentication runs before any per-route role check
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

/// Wraps a method router in the role gate for `roles`.
fn restricted(route: MethodRouter<AppState>, roles: RoleSet) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(roles, require_role))
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/me", restricted(get(protected::me_get), RoleSet::ANY))
        .route("/verify", restricted(get(protected::verify_get), RoleSet::ANY))
}

fn worker_routes() -> Router<AppState> {
    use protected::workers;

    Router::new()
        .route(
            "/workers",
            restricted(get(workers::list), RoleSet::ANY)
                .merge(restricted(post(workers::create), RoleSet::EDITORS)),
        )
        .route("/workers/count", restricted(get(workers::count), RoleSet::ANY))
        .route(
            "/workers/:id",
            restricted(get(workers::get), RoleSet::ANY)
                .merge(restricted(put(workers::update), RoleSet::EDITORS))
                .merge(restricted(delete(workers::delete), RoleSet::EDITORS)),
        )
}

fn history_routes(prefix: &str) -> Router<AppState> {
    use protected::history;

    Router::new()
        .route(
            prefix,
            restricted(get(history::list), RoleSet::ANY)
                .merge(restricted(post(history::create), RoleSet::EDITORS)),
        )
        .route(&format!("{}/count", prefix), restricted(get(history::count), RoleSet::ANY))
        .route(
            &format!("{}/:id", prefix),
            restricted(get(history::get), RoleSet::ANY)
                .merge(restricted(put(history::update), RoleSet::EDITORS))
                .merge(restricted(delete(history::delete), RoleSet::EDITORS)),
        )
}

fn reference_routes() -> Router<AppState> {
    ReferenceTable::ALL
        .into_iter()
        .fold(Router::new(), |router, table| router.merge(reference_table_routes(table)))
}

fn reference_table_routes(table: ReferenceTable) -> Router<AppState> {
    use protected::reference;

    let base = format!("/api/{}", table.route_segment());
    let policy = table.policy();

    Router::new()
        .route(
            &base,
            restricted(get(reference::list), policy.read)
                .merge(restricted(post(reference::create), policy.write)),
        )
        .route(&format!("{}/count", base), restricted(get(reference::count), policy.read))
        .route(
            &format!("{}/:id", base),
            restricted(get(reference::get), policy.read)
                .merge(restricted(put(reference::update), policy.write))
                .merge(restricted(delete(reference::delete), policy.delete)),
        )
        .layer(Extension(table))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Credentials are only sent to an explicit origin list
    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(AllowOrigin::any())
    } else {
        cors.allow_origin(AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ))
        .allow_credentials(true)
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!("Handler panicked: {}", detail);
    ApiError::internal(detail).into_response()
}
