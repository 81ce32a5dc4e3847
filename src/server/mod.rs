//! The REST API.
//!
//! Routes live under `/api` and call straight into `crate::commands`. Failures are returned as
//! `{"message": "..."}` with a status chosen from the error's `ErrorType`.

mod extract;
mod handlers;

use crate::error::{ErrorType, IntoResult};
use crate::resources::ResourceCatalog;
use crate::{Config, Error};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared by every request.
#[derive(Clone)]
pub(crate) struct AppState {
    config: Config,
    catalog: Arc<ResourceCatalog>,
}

impl AppState {
    pub(crate) fn new(config: Config) -> Self {
        let catalog = Arc::new(ResourceCatalog::new(config.resources_path()));
        Self { config, catalog }
    }
}

pub(crate) fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        .route("/tips", get(handlers::list_tips))
        .route("/tips/next", post(handlers::next_tip))
        .route("/tips/progress", get(handlers::tip_progress))
        .route("/quiz", get(handlers::list_quiz))
        .route("/quiz/score", post(handlers::score_quiz))
        .route(
            "/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/goals/:id",
            patch(handlers::update_goal).delete(handlers::delete_goal),
        )
        .route("/goals/:id/purchase", post(handlers::purchase_goal))
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/summary", get(handlers::expense_summary))
        .route(
            "/expenses/:id",
            patch(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route("/resources", get(handlers::list_resources));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API on the configured bind address until Ctrl-C.
pub(crate) async fn run(config: Config, port: u16) -> crate::Result<()> {
    let addr = format!("{}:{port}", config.bind());
    let listener = TcpListener::bind(addr.as_str())
        .await
        .pub_result(ErrorType::Service)?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router(AppState::new(config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .pub_result(ErrorType::Service)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

impl ErrorType {
    fn status(self) -> StatusCode {
        match self {
            ErrorType::Request => StatusCode::BAD_REQUEST,
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Conflict => StatusCode::CONFLICT,
            ErrorType::Config | ErrorType::Database | ErrorType::Service | ErrorType::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.error_type().status();
        if status.is_server_error() {
            error!("{}", self.chain());
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Api {
        env: TestEnv,
        app: Router,
    }

    impl Api {
        async fn new() -> Self {
            let env = TestEnv::new().await;
            let app = router(AppState::new(env.config()));
            Self { env, app }
        }

        async fn with_tips(texts: &[&str]) -> Self {
            let api = Self::new().await;
            api.env.insert_tips(texts).await;
            api
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(v) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(v.to_string())
                }
                None => Body::empty(),
            };
            let response = self
                .app
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(&bytes).to_string())
                })
            };
            (status, value)
        }

        async fn register(&self, email: &str) -> String {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(json!({"email": email, "password": "pw"})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["token"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let api = Api::new().await;
        let (status, body) = api.call(Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_auth_flow() {
        let api = Api::new().await;
        let token = api.register("Sam@Example.com").await;

        let (status, body) = api
            .call(Method::GET, "/api/auth/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "sam@example.com");
        assert!(body["user"].get("passwordHash").is_none());

        let (status, body) = api
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"email": "sam@example.com", "password": "x"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email in use");

        let (status, body) = api
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "sam@example.com", "password": "nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = api.call(Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing token");

        let (status, body) = api
            .call(Method::GET, "/api/auth/me", Some("garbage"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_expenses_and_summary() {
        let api = Api::new().await;
        let token = api.register("a@b.c").await;
        for (amount, category, date) in [
            (json!(50), "purchase", "2024-01-05"),
            (json!("30"), "other", "2024-01-20"),
            (json!(20.0), "purchase", "2024-02-01"),
        ] {
            let (status, body) = api
                .call(
                    Method::POST,
                    "/api/expenses",
                    Some(&token),
                    Some(json!({"amount": amount, "category": category, "date": date})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }

        let (status, body) = api
            .call(
                Method::GET,
                "/api/expenses/summary?from=2024-01-01&to=2024-02-01",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "total": 80.0,
                "byCategory": [
                    {"category": "purchase", "total": 50.0, "share": 0.625},
                    {"category": "other", "total": 30.0, "share": 0.375}
                ],
                "byMonth": [{"month": "2024-01", "total": 80.0}],
                "topCategory": {"category": "purchase", "total": 50.0, "share": 0.625}
            })
        );

        let (status, body) = api
            .call(Method::GET, "/api/expenses?limit=2", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["date"], "2024-02-01");

        let (status, _) = api
            .call(
                Method::GET,
                "/api/expenses/summary?from=yesterday",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = api
            .call(Method::GET, "/api/expenses", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_expense_bodies() {
        let api = Api::new().await;
        let token = api.register("a@b.c").await;
        for body in [
            json!({"amount": -1}),
            json!({"amount": "lots"}),
            json!({"amount": 5, "colour": "red"}),
            json!({"amount": 5, "category": "groceries"}),
            json!({"category": "other"}),
        ] {
            let (status, response) = api
                .call(Method::POST, "/api/expenses", Some(&token), Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {response}");
            assert!(response["message"].is_string());
        }

        for body in [
            json!({"amount": "79228162514264337593543950335"}),
            json!({"amount": 1_000_000_000_000_u64}),
            json!({"amount": 0.001}),
        ] {
            let (status, response) = api
                .call(Method::POST, "/api/expenses", Some(&token), Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {response}");
            assert_eq!(response["message"], "Invalid amount");
        }

        let (status, body) = api
            .call(
                Method::PATCH,
                "/api/expenses/missing",
                Some(&token),
                Some(json!({"note": "x"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Expense not found");
    }

    #[tokio::test]
    async fn test_tip_rotation_per_user() {
        let api = Api::with_tips(&["one", "two"]).await;
        let (status, body) = api.call(Method::GET, "/api/tips", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let alice = api.register("alice@b.c").await;
        let bob = api.register("bob@b.c").await;

        let (_, first) = api
            .call(Method::POST, "/api/tips/next", Some(&alice), None)
            .await;
        let (_, second) = api
            .call(Method::POST, "/api/tips/next", Some(&alice), None)
            .await;
        assert_ne!(first["tip"]["id"], second["tip"]["id"]);
        assert_eq!(second["progress"], json!({"seen": 2, "total": 2}));

        let (status, body) = api
            .call(Method::GET, "/api/tips/progress", Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"seen": 0, "total": 2}));

        let (status, _) = api.call(Method::POST, "/api/tips/next", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_no_tips_is_not_an_error() {
        let api = Api::new().await;
        let token = api.register("a@b.c").await;
        let (status, body) = api
            .call(Method::POST, "/api/tips/next", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tip"], Value::Null);
        assert_eq!(body["progress"], json!({"seen": 0, "total": 0}));
    }

    #[tokio::test]
    async fn test_goal_lifecycle() {
        let api = Api::new().await;
        let token = api.register("a@b.c").await;
        let (status, body) = api
            .call(
                Method::POST,
                "/api/goals",
                Some(&token),
                Some(json!({"itemName": "Bike", "targetPrice": 100, "savedAmount": 100})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["progress"]["fullyFunded"], true);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = api
            .call(
                Method::POST,
                &format!("/api/goals/{id}/purchase"),
                Some(&token),
                Some(json!({"purchasePrice": 95, "purchasedAt": "2024-05-01"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "purchased");
        assert_eq!(body["purchasePrice"], 95.0);

        let other = api.register("x@y.z").await;
        let (status, _) = api
            .call(Method::DELETE, &format!("/api/goals/{id}"), Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = api
            .call(Method::DELETE, &format!("/api/goals/{id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_quiz_and_resources() {
        let api = Api::new().await;
        let (status, body) = api.call(Method::GET, "/api/quiz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = api
            .call(
                Method::POST,
                "/api/quiz/score",
                None,
                Some(json!({"answers": {}})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["percentage"], 0);

        let (status, body) = api
            .call(Method::GET, "/api/resources?q=budget&limit=5", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, _) = api
            .call(Method::GET, "/api/resources?sort=new", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
