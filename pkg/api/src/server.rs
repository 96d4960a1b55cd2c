use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;
use crate::auth::auth_middleware;
use crate::handlers::{events, secrets, vaults};
use crate::request_id::request_id_middleware;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    // Protected API routes
    let api_routes = Router::new()
        .route(
            "/api/v1/namespaces/{ns}/vaults",
            post(vaults::create_vault).get(vaults::list_vaults),
        )
        .route(
            "/api/v1/namespaces/{ns}/vaults/{name}",
            get(vaults::get_vault).delete(vaults::delete_vault),
        )
        .route("/api/v1/namespaces/{ns}/secrets", get(secrets::list_secrets))
        .route(
            "/api/v1/namespaces/{ns}/secrets/{name}",
            get(secrets::get_secret),
        )
        .route("/api/v1/events", get(events::list_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use pkg_controllers::handler::EventHandler;
    use pkg_controllers::keyvalue::KeyValueRefresh;
    use pkg_controllers::notification::StoreEventNotification;
    use pkg_controllers::refresh::TypeRefreshFactory;
    use pkg_state::client::StateStore;
    use pkg_state::registry::{Cluster, Registry};
    use pkg_types::event::{Event, EventType};
    use pkg_vault::{VaultClient, VaultClientConfig};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "api-token";

    async fn test_app(server: &MockServer) -> (Router, Registry) {
        let registry = Registry::new(StateStore::in_memory().await.unwrap());
        let cluster: Arc<dyn Cluster> = Arc::new(registry.clone());
        let client = VaultClient::new(VaultClientConfig {
            base_url: format!("{}/v1/", server.uri()),
            token: None,
            request_timeout: Duration::from_secs(2),
        })
        .unwrap();
        let factory = Arc::new(
            TypeRefreshFactory::new()
                .register(Arc::new(KeyValueRefresh::new(cluster.clone(), client))),
        );
        let state = AppState {
            registry: registry.clone(),
            handler: Arc::new(EventHandler::new(cluster, factory)),
            notifier: Arc::new(StoreEventNotification::new(registry.clone())),
            api_token: TOKEN.to_string(),
        };
        (router(state), registry)
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn kv_declaration() -> serde_json::Value {
        serde_json::json!({
            "name": "app",
            "spec": { "type": "KEYVALUE", "path": "secret/app" }
        })
    }

    async fn events(app: &Router) -> Vec<Event> {
        let resp = app
            .clone()
            .oneshot(request("GET", "/api/v1/events?namespace=default", None))
            .await
            .unwrap();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_is_public_and_api_is_not() {
        let server = MockServer::start().await;
        let (app, _) = test_app(&server).await;

        let resp = app
            .clone()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));

        let resp = app
            .oneshot(
                Request::get("/api/v1/namespaces/default/vaults")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn declaring_a_vault_delivers_its_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "password": "hunter2" }
            })))
            .mount(&server)
            .await;
        let (app, registry) = test_app(&server).await;

        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/namespaces/default/vaults",
                Some(kv_declaration()),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert!(registry.get_vault("default", "app").await.unwrap().is_some());

        let resp = app
            .clone()
            .oneshot(request("GET", "/api/v1/namespaces/default/secrets/app", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let kinds: Vec<EventType> = events(&app).await.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventType::Addition]);

        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/namespaces/default/vaults",
                Some(kv_declaration()),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = app
            .clone()
            .oneshot(request("DELETE", "/api/v1/namespaces/default/vaults/app", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(registry.get_secret("default", "app").await.unwrap().is_none());
        assert!(registry.get_vault("default", "app").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_delivery_keeps_binding_and_records_event() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let (app, registry) = test_app(&server).await;

        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/namespaces/default/vaults",
                Some(kv_declaration()),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(registry.get_vault("default", "app").await.unwrap().is_some());
        assert!(registry.get_secret("default", "app").await.unwrap().is_none());

        let events = events(&app).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventType::AdditionFailed);
        assert_eq!(events[0].binding_name, "app");
    }

    #[tokio::test]
    async fn rejects_invalid_declarations() {
        let server = MockServer::start().await;
        let (app, registry) = test_app(&server).await;

        let pki_without_config = serde_json::json!({
            "name": "pki",
            "spec": { "type": "PKI", "path": "testpki/issue/testrole" }
        });
        let resp = app
            .oneshot(request(
                "POST",
                "/api/v1/namespaces/default/vaults",
                Some(pki_without_config),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(registry.list_vaults_in("default").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_declarations_admit_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "password": "hunter2" }
            })))
            .mount(&server)
            .await;
        let (app, _) = test_app(&server).await;

        let uri = "/api/v1/namespaces/default/vaults";
        let (a, b) = tokio::join!(
            app.clone().oneshot(request("POST", uri, Some(kv_declaration()))),
            app.clone().oneshot(request("POST", uri, Some(kv_declaration()))),
        );
        let mut statuses = vec![a.unwrap().status(), b.unwrap().status()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

        let kinds: Vec<EventType> = events(&app).await.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventType::Addition]);
    }
}

