#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use payroll_api::auth::Role;
use payroll_api::config::AppConfig;
use payroll_api::database::models::{NewUser, User};
use payroll_api::database::{MemoryStore, Store, UserStore};
use payroll_api::{app, AppState};

pub const PASSWORD: &str = "Secret123";

/// Router served on a free port over a test-owned store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<dyn Store>,
    pub client: Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.get(self.url(path)), token)
    }

    pub fn post(&self, path: &str, token: Option<&str>, body: Value) -> RequestBuilder {
        with_token(self.client.post(self.url(path)), token).json(&body)
    }

    pub fn put(&self, path: &str, token: Option<&str>, body: Value) -> RequestBuilder {
        with_token(self.client.put(self.url(path)), token).json(&body)
    }

    pub fn delete(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.delete(self.url(path)), token)
    }

    pub async fn register(&self, username: &str, role: &str, special_password: Option<&str>) -> Result<Response> {
        let mut body = json!({ "username": username, "password": PASSWORD, "role": role });
        if let Some(secret) = special_password {
            body["specialPassword"] = json!(secret);
        }
        send(self.post("/register", None, body)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response> {
        send(self.post("/login", None, json!({ "username": username, "password": password }))).await
    }

    /// Registers `username` with `role` and returns a bearer token for it.
    pub async fn token_for(&self, username: &str, role: Role) -> Result<String> {
        let secret = match role {
            Role::Admin => Some("adminsecret"),
            Role::Editor => Some("editorsecret"),
            Role::User => None,
        };
        let res = self.register(username, role.as_str(), secret).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "register failed: {:?}", res.body);

        let res = self.login(username, PASSWORD).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login failed: {:?}", res.body);
        res.body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Writes a user row directly, bypassing registration.
    pub async fn insert_user(&self, username: &str, password_hash: String, role: Role) -> Result<User> {
        let user = self
            .store
            .insert_user(&NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?;
        Ok(user)
    }

    /// Creates a reference entry and returns its id.
    pub async fn create_reference(&self, token: &str, segment: &str, name: &str) -> Result<i64> {
        let res = send(self.post(&format!("/api/{}", segment), Some(token), json!({ "name": name }))).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create {} failed: {:?}", segment, res.body);
        res.id()
    }

    /// Creates one entry per worker reference table and returns a valid worker body.
    pub async fn worker_body(&self, token: &str) -> Result<Value> {
        let gender_id = self.create_reference(token, "genders", "Female").await?;
        let prof_id = self.create_reference(token, "professions", "Accountant").await?;
        let position_id = self.create_reference(token, "positions", "Senior").await?;
        let education_id = self.create_reference(token, "education", "Higher").await?;

        Ok(json!({
            "name": "Anna",
            "fam": "Petrova",
            "otch": "Sergeevna",
            "gender_id": gender_id,
            "prof_id": prof_id,
            "position_id": position_id,
            "education_id": education_id,
            "salary": 52000.5,
            "date_r": "1990-04-12",
            "date_hired": "2020-01-15"
        }))
    }
}

/// Status plus parsed JSON body.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl Response {
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn id(&self) -> Result<i64> {
        self.body["data"]["id"].as_i64().context("response has no data.id")
    }
}

pub async fn send(request: RequestBuilder) -> Result<Response> {
    let res = request.send().await?;
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    Ok(Response { status, body })
}

fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn wait_ready(client: &Client, base_url: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if Instant::now() > deadline {
            break;
        }
        if let Ok(resp) = client.get(format!("{}/health", base_url)).send().await {
            if resp.status() == StatusCode::OK {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("server did not become ready on {} within {:?}", base_url, timeout)
}

/// Starts a server on the current runtime. Each test gets its own store.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_on(Arc::new(MemoryStore::new())).await
}

/// `DATABASE_URL` when it names a real database; `None` skips the postgres tests.
pub fn postgres_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty() && !url.starts_with("memory:"))
}

/// Suffix that keeps names unique across runs against a shared database.
pub fn unique_suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}", nanos)
}

pub async fn spawn_server_on(store: Arc<dyn Store>) -> Result<TestServer> {
    spawn_server_with(AppConfig::development(), store).await
}

pub async fn spawn_server_with(config: AppConfig, store: Arc<dyn Store>) -> Result<TestServer> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let state = AppState::new(config, store.clone())?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test port")?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app(state)).await {
            tracing::error!("test server stopped: {}", e);
        }
    });

    let client = Client::new();
    wait_ready(&client, &base_url, Duration::from_secs(10)).await?;

    Ok(TestServer { port, base_url, store, client })
}
