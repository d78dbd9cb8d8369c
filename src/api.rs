use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::get,
};
use serde_json::{Value, json};

use crate::{
    AppError, AppResult, AppState,
    auth::Profile,
    engine::{Engine, Stats},
    ids::UserId,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/users", get(users))
        .route("/api/users/{id}", get(user))
}

#[debug_handler(state = AppState)]
async fn health(State(engine): State<Arc<Engine>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": engine.connection_count(),
    }))
}

#[debug_handler(state = AppState)]
async fn stats(State(engine): State<Arc<Engine>>) -> Json<Stats> {
    Json(engine.stats())
}

#[debug_handler(state = AppState)]
async fn users(State(engine): State<Arc<Engine>>) -> Json<Vec<Profile>> {
    Json(engine.auth().users())
}

#[debug_handler(state = AppState)]
async fn user(
    Path(id): Path<UserId>,
    State(engine): State<Arc<Engine>>,
) -> AppResult<Json<Profile>> {
    engine
        .auth()
        .profile(&id)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no such user: {id}")))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::{AccountStore, Registration},
        config::Config,
    };

    async fn app_with_user() -> (Router, Profile) {
        let accounts = Arc::new(AccountStore::new(4));
        let engine = Arc::new(Engine::new(&Config::default(), accounts));
        let profile = engine
            .auth()
            .create(Registration {
                email: "maria@demo.ru".to_owned(),
                password: "123456".to_owned(),
                first_name: "Maria".to_owned(),
                last_name: "Ivanova".to_owned(),
                username: "maria".to_owned(),
                bio: None,
            })
            .await
            .unwrap();
        (crate::app(AppState { engine }), profile)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn stats_counts_users() {
        let (app, _) = app_with_user().await;
        let (status, body) = get_json(app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "onlineUsers": 0, "totalUsers": 1, "totalPosts": 0, "totalChats": 0 })
        );
    }

    #[tokio::test]
    async fn users_lists_public_profiles() {
        let (app, profile) = app_with_user().await;
        let (status, body) = get_json(app, "/api/users").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["handle"], "maria");
        assert_eq!(body[0]["id"], json!(profile.id));
        assert!(body[0].get("password").is_none());
        assert!(body[0].get("email").is_none());
    }

    #[tokio::test]
    async fn user_by_id() {
        let (app, profile) = app_with_user().await;
        let (status, body) = get_json(app.clone(), &format!("/api/users/{}", profile.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["displayName"], "Maria Ivanova");

        let (status, _) = get_json(app, &format!("/api/users/{}", UserId::new())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_connections() {
        let (app, _) = app_with_user().await;
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "connections": 0 }));
    }
}
