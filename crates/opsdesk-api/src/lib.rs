pub mod auth;
pub mod error;
pub mod incidents;
pub mod middleware;
pub mod products;
pub mod state;

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, patch, post, put},
};

use tracing::error;

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Run blocking work (SQLite, password hashing) off the async runtime.
pub(crate) async fn blocking<F, T, E>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppState) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(Into::into)
}

/// All REST routes. Mutating endpoints sit behind the bearer-token guard.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .route("/users", get(incidents::list_users))
        .route("/incidents", get(incidents::list_incidents))
        .route("/incidents/{id}", get(incidents::get_incident))
        .route("/notifications", get(incidents::list_notifications))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            patch(products::update_product).delete(products::delete_product),
        )
        .route("/incidents", post(incidents::report_incident))
        .route("/incidents/{id}", put(incidents::update_incident))
        .route("/incidents/{id}/comments", post(incidents::add_comment))
        .route("/notifications/{id}/read", post(incidents::mark_notification_read))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}


#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::test_support::{send, test_app};

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
