#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use mira_api::{AppState, AppStateInner, mailer::Mailer};
use mira_companion::{ChatClient, SpeechClient, anthropic::DEFAULT_MODEL};
use mira_db::Database;
use mira_patterns::LocalClock;

pub const JWT_SECRET: &str = "test-secret";
pub const RESET_URL: &str = "http://mira.test/reset";

/// Canned vendor behavior plus everything the stub received.
#[derive(Clone, Default)]
pub struct Stub {
    pub reply: Arc<Mutex<String>>,
    pub mail: Arc<Mutex<Vec<Value>>>,
    /// When set, the mail webhook answers 500 and keeps nothing.
    pub mail_down: Arc<AtomicBool>,
}

impl Stub {
    pub fn set_reply(&self, text: &str) {
        *self.reply.lock().unwrap() = text.to_string();
    }

    pub fn take_mail_down(&self) {
        self.mail_down.store(true, Ordering::SeqCst);
    }

    pub fn mail(&self) -> Vec<Value> {
        self.mail.lock().unwrap().clone()
    }
}

async fn stub_messages(State(stub): State<Stub>) -> Json<Value> {
    let text = stub.reply.lock().unwrap().clone();
    Json(json!({
        "id": "msg_test",
        "type": "message",
        "content": [{ "type": "text", "text": text }],
    }))
}

async fn stub_mail(State(stub): State<Stub>, Json(body): Json<Value>) -> StatusCode {
    if stub.mail_down.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    stub.mail.lock().unwrap().push(body);
    StatusCode::OK
}

/// Serve the stub on an ephemeral port and return its base URL.
async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/v1/messages", post(stub_messages))
        .route("/mail", post(stub_mail))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub stub: Stub,
    _dir: TempDir,
}

impl TestApp {
    /// App backed by a fresh database file, with a chat key configured.
    pub async fn new() -> Self {
        Self::build(Some("test-key".to_string())).await
    }

    pub async fn without_key() -> Self {
        Self::build(None).await
    }

    async fn build(chat_key: Option<String>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("mira.db")).unwrap();

        let stub = Stub::default();
        let base = spawn_stub(stub.clone()).await;

        let state: AppState = Arc::new(AppStateInner {
            db,
            jwt_secret: JWT_SECRET.to_string(),
            chat: ChatClient::new(chat_key, &base, DEFAULT_MODEL).unwrap(),
            speech: SpeechClient::new(None, None, &base).unwrap(),
            clock: LocalClock::utc(),
            mailer: Mailer::new(Some(format!("{}/mail", base))).unwrap(),
            reset_url: RESET_URL.to_string(),
        });

        Self {
            router: mira_api::router(state.clone()),
            state,
            stub,
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Sign up and return (user id, token).
    pub async fn signup(&self, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/auth/signup",
                None,
                json!({ "email": email, "password": password, "confirm_password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        (
            body["user_id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}
