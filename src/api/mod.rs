pub mod handlers;
pub mod types;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::account::AccountService;
use crate::auth::{gate, TokenVerifier};

#[derive(Clone)]
pub struct AppState {
    pub service: AccountService,
    pub verifier: Arc<TokenVerifier>,
}

pub struct ApiServer {
    state: AppState,
    bind_addr: String,
}

impl ApiServer {
    pub fn new(service: AccountService, verifier: TokenVerifier, port: u16) -> Self {
        Self {
            state: AppState {
                service,
                verifier: Arc::new(verifier),
            },
            bind_addr: format!("0.0.0.0:{}", port),
        }
    }

    pub async fn start(self) {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .expect("Failed to bind API server");

        info!("API server listening on {}", self.bind_addr);
        axum::serve(listener, app).await.expect("API server failed");
    }
}

/// Every route goes through the authentication gate; CORS stays
/// permissive for browser clients.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/account", post(handlers::create_account))
        .route("/account/user-id", get(handlers::get_user_id))
        .route("/account/number/:number", get(handlers::get_account_by_number))
        .route("/account/customer/:customer_id", get(handlers::get_customer_accounts))
        .route(
            "/account/:id",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::close_account),
        )
        .route("/account/:id/suspend", put(handlers::suspend_account))
        .route("/account/:id/activate", put(handlers::activate_account))
        .route(
            "/account/:id/balance",
            get(handlers::get_balance).put(handlers::update_balance),
        )
        .layer(middleware::from_fn_with_state(state.clone(), gate::auth_gate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountStore;
    use crate::config::ServiceConfig;
    use crate::storage::Storage;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"api-test-secret";

    fn test_router() -> Router {
        let storage = Storage::temporary().unwrap();
        let store = AccountStore::new(&storage).unwrap();
        let service = AccountService::new(store, ServiceConfig::default().account);
        router(AppState {
            service,
            verifier: Arc::new(TokenVerifier::new(SECRET)),
        })
    }

    fn bearer_for(user_id: Option<u64>) -> String {
        let token = TokenVerifier::new(SECRET)
            .issue("alice", user_id, Some("USER"), 3600)
            .unwrap();
        format!("Bearer {}", token)
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(method: &str, uri: &str, auth: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn send_empty(method: &str, uri: &str, auth: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_router().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "UP");
    }

    #[tokio::test]
    async fn test_protected_path_without_token() {
        let response = test_router().oneshot(get("/account/1", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "TOKEN_MISSING");
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let token = TokenVerifier::new(SECRET)
            .issue("alice", None, None, -60)
            .unwrap();
        let auth = format!("Bearer {}", token);

        let response = test_router()
            .oneshot(get("/account/5", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_bad_token_blocks_even_unclassified_paths() {
        let response = test_router()
            .oneshot(get("/somewhere-else", Some("Bearer not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "TOKEN_MALFORMED");
    }

    #[tokio::test]
    async fn test_unclassified_path_passes_without_token() {
        let response = test_router()
            .oneshot(get("/somewhere-else", None))
            .await
            .unwrap();
        // Passes the gate and falls through to routing
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_and_fetch_account() {
        let router = test_router();
        let auth = bearer_for(Some(42));

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/account",
                &auth,
                json!({ "customerId": 7, "accountType": "SAVINGS" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["customerId"], 7);
        assert_eq!(created["status"], "ACTIVE");
        assert_eq!(created["balance"], json!(0.0));
        assert_eq!(created["currency"], "EUR");
        let number = created["accountNumber"].as_str().unwrap().to_string();
        assert_eq!(number.len(), 19);

        let id = created["id"].as_u64().unwrap();
        let response = router
            .clone()
            .oneshot(get(&format!("/account/{}", id), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched, created);

        let response = router
            .oneshot(get(&format!("/account/number/{}", number), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let response = test_router()
            .oneshot(send_json("POST", "/account", &bearer_for(None), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["details"]["customerId"].is_string());
        assert!(body["details"]["accountType"].is_string());
    }

    #[tokio::test]
    async fn test_missing_account_maps_to_404() {
        let response = test_router()
            .oneshot(get("/account/999", Some(&bearer_for(None))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "ACCOUNT_NOT_FOUND");
        assert_eq!(body["message"], "Account not found with ID: 999");
    }

    #[tokio::test]
    async fn test_balance_and_close_flow() {
        let router = test_router();
        let auth = bearer_for(Some(42));

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/account",
                &auth,
                json!({ "customerId": 7, "accountType": "CURRENT" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        // Within the default overdraft limit of 100
        let response = router
            .clone()
            .oneshot(send_empty(
                "PUT",
                &format!("/account/{}/balance?newBalance=-50", id),
                &auth,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!(-50.0));

        // Breaching the limit leaves the balance untouched
        let response = router
            .clone()
            .oneshot(send_empty(
                "PUT",
                &format!("/account/{}/balance?newBalance=-150", id),
                &auth,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "INSUFFICIENT_FUNDS");

        let response = router
            .clone()
            .oneshot(get(&format!("/account/{}/balance", id), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!(-50.0));

        // Closing requires an exactly zero balance
        let response = router
            .clone()
            .oneshot(send_empty("DELETE", &format!("/account/{}", id), &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "INVALID_OPERATION");

        let response = router
            .clone()
            .oneshot(send_empty(
                "PUT",
                &format!("/account/{}/balance?newBalance=0", id),
                &auth,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(send_empty("DELETE", &format!("/account/{}", id), &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Closed is terminal
        let response = router
            .oneshot(send_empty("PUT", &format!("/account/{}/suspend", id), &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_suspend_and_activate() {
        let router = test_router();
        let auth = bearer_for(None);

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/account",
                &auth,
                json!({ "customerId": 3, "accountType": "JOINT" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        let response = router
            .clone()
            .oneshot(send_empty("PUT", &format!("/account/{}/suspend", id), &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(get(&format!("/account/{}", id), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "SUSPENDED");

        let response = router
            .clone()
            .oneshot(send_empty("PUT", &format!("/account/{}/activate", id), &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_customer_listing_and_paging() {
        let router = test_router();
        let auth = bearer_for(None);

        for _ in 0..3 {
            router
                .clone()
                .oneshot(send_json(
                    "POST",
                    "/account",
                    &auth,
                    json!({ "customerId": 9, "accountType": "CURRENT" }),
                ))
                .await
                .unwrap();
        }

        let response = router
            .clone()
            .oneshot(get("/account/customer/9", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);

        let response = router
            .clone()
            .oneshot(get("/account/customer/9?page=1&size=2", Some(&auth)))
            .await
            .unwrap();
        let page = body_json(response).await;
        assert_eq!(page["content"].as_array().unwrap().len(), 1);
        assert_eq!(page["totalElements"], 3);
        assert_eq!(page["totalPages"], 2);

        let response = router
            .oneshot(get("/account/customer/9?page=0&size=0", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_account_fields() {
        let router = test_router();
        let auth = bearer_for(None);

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/account",
                &auth,
                json!({ "customerId": 5, "accountType": "PROFESSIONAL" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        let response = router
            .clone()
            .oneshot(send_json(
                "PUT",
                &format!("/account/{}", id),
                &auth,
                json!({ "overdraftLimit": 250, "currency": "USD" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["overdraftLimit"], json!(250.0));
        assert_eq!(body["currency"], "USD");
    }

    #[tokio::test]
    async fn test_user_id_endpoint() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(get("/account/user-id", Some(&bearer_for(Some(42)))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!(42));

        let response = router
            .oneshot(get("/account/user-id", Some(&bearer_for(None))))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!(-1));
    }
}
