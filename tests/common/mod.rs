#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use goalboard::{
    db::{DivisionRepository, MemoryStore, UserRepository},
    models::auth::{NewUser, Role, User},
    services::auth::hash_password,
    AppState, Repositories, Settings,
};

pub const PASSWORD: &str = "secret123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.bytes).expect("response body should be JSON")
    }
}

pub fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let mut settings = Settings::new("postgres://unused", "test-secret");
    settings.bcrypt_cost = 4;

    let state = AppState::new(settings, Repositories::in_memory(store.clone()));
    let router = goalboard::build_router(state.clone());
    TestApp { router, state, store }
}

impl TestApp {
    pub async fn division(&self, name: &str) -> i32 {
        DivisionRepository::create(&self.store, name).await.unwrap().id
    }

    /// Cria o usuário direto no repositório e devolve um token válido.
    pub async fn user(&self, email: &str, role: Role, division_id: Option<i32>) -> (User, String) {
        let password_hash = hash_password(PASSWORD, 4).await.unwrap();
        let user = UserRepository::create(
            &self.store,
            &NewUser {
                email: email.to_string(),
                password_hash,
                name: email.split('@').next().unwrap_or(email).to_string(),
                role,
                division_id,
            },
        )
        .await
        .unwrap();
        let token = self.state.auth_service.create_token(&user).unwrap();
        (user, token)
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse { status, headers, bytes }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}
