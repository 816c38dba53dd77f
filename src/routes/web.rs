use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::session_middleware;
use crate::handlers::{
    generate_cert, health_check_handler, index, login_page, login_submit, logout,
};
use crate::routes::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check_handler))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout));

    // Pages for logged-in participants
    let protected_routes = Router::new()
        .route("/", get(index))
        .route("/generate_cert", post(generate_cert))
        .layer(middleware::from_fn_with_state(
            state.session_state.clone(),
            session_middleware,
        ));

    let middleware_stack = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(middleware_stack)
}
