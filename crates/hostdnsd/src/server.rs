//! HTTP harness
//!
//! Maps query parameters onto a [`ControlRequest`] and the controller's
//! [`ControlResponse`](hostdns_core::ControlResponse) back onto HTTP. All
//! orchestration decisions stay in `hostdns-core`.
//!
//! | Route          | Purpose                                    |
//! |----------------|--------------------------------------------|
//! | `GET /`        | `?action=start\|stop&target=<name>`        |
//! | `POST /`       | Same parameters, for callers that POST     |
//! | `GET /health`  | Liveness                                   |

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use hostdns_core::{ControlRequest, ControlResponse, Error, LifecycleController};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Build the router
pub fn router(controller: Arc<LifecycleController>) -> Router {
    Router::new()
        .route("/", get(control).post(control))
        .route("/health", get(health_check))
        .with_state(controller)
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve(
    controller: Arc<LifecycleController>,
    bind_address: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(controller))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn control(
    State(controller): State<Arc<LifecycleController>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Response {
    // Repeated keys keep the last value
    let response = match query {
        Ok(Query(params)) => {
            controller
                .handle(&ControlRequest::from_params(&params))
                .await
        }
        Err(rejection) => {
            ControlResponse::from_outcome(Err(Error::invalid_input(rejection.body_text())))
        }
    };
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, response.content_type())],
        response.body,
    )
        .into_response()
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use hostdns_core::config::{HostDnsConfig, PollConfig, ProviderConfig};
    use hostdns_core::ProviderRegistry;
    use tower::ServiceExt;

    async fn setup() -> Router {
        let registry = ProviderRegistry::new();
        hostdns_core::providers::memory::register(&registry);

        let config = HostDnsConfig::new(ProviderConfig::Memory, "game", "i-0game", "game.example.com")
            .with_target("development", "i-0dev")
            .with_poll(PollConfig::new(3, 0));
        let gateway = registry.create_gateway(&config).await.unwrap();
        let controller = LifecycleController::new(config, gateway).unwrap();

        router(Arc::new(controller))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = setup().await;

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn start_then_stop_round() {
        let router = setup().await;

        let request = Request::builder()
            .method("GET")
            .uri("/?action=start&machine=game")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        // Memory provider: development → .1, game → .2
        assert_eq!(
            body_text(response).await,
            r#"{"prev":"stopped","cur":"running","ip":"203.0.113.2"}"#
        );

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"{"prev":"running","cur":"stopped","ip":""}"#
        );
    }

    #[tokio::test]
    async fn repeated_parameters_are_accepted() {
        let router = setup().await;

        let request = Request::builder()
            .method("GET")
            .uri("/?action=start&target=game&machine=development")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"{"prev":"stopped","cur":"running","ip":"203.0.113.2"}"#
        );

        let request = Request::builder()
            .method("GET")
            .uri("/?action=start&action=stop&target=game&target=game")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"{"prev":"running","cur":"stopped","ip":""}"#
        );
    }

    #[tokio::test]
    async fn unknown_target_is_plain_text_500() {
        let router = setup().await;

        let request = Request::builder()
            .method("GET")
            .uri("/?action=start&target=staging")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert!(body_text(response).await.contains("staging"));
    }
}
