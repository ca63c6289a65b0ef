#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use teklif_api::config::AppConfig;
use teklif_api::database::MemoryCatalog;
use teklif_api::{app, AppContext};

/// In-process server over the in-memory stores, one per test
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub catalog: Arc<MemoryCatalog>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let catalog = Arc::new(MemoryCatalog::new());
        let ctx = AppContext::with_memory(AppConfig::in_memory(), catalog.clone())?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(ctx)).await;
        });

        let server = Self {
            port,
            base_url,
            catalog,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Register a company and log it in, returning the login `data` object
    pub async fn signup_and_login(
        &self,
        email: &str,
        is_supplier: bool,
        is_constructor: bool,
    ) -> Result<Value> {
        let signup = self
            .client
            .post(self.api("/auth/signup"))
            .json(&signup_body(email, is_supplier, is_constructor))
            .send()
            .await?;
        anyhow::ensure!(
            signup.status() == StatusCode::CREATED,
            "signup failed: {}",
            signup.text().await?
        );

        let login = self
            .client
            .post(self.api("/auth/login"))
            .json(&json!({"email": email, "password": "correct-horse"}))
            .send()
            .await?;
        anyhow::ensure!(login.status() == StatusCode::OK, "login failed");
        let body: Value = login.json().await?;
        Ok(body["data"].clone())
    }

    /// Access token of a freshly registered company
    pub async fn token(&self, email: &str, is_supplier: bool, is_constructor: bool) -> Result<String> {
        let tokens = self.signup_and_login(email, is_supplier, is_constructor).await?;
        tokens["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access_token")
    }
}

pub fn signup_body(email: &str, is_supplier: bool, is_constructor: bool) -> Value {
    json!({
        "name": "Anadolu Yapı",
        "company_type": "Limited Şirketi",
        "web_site": "https://anadoluyapi.example.com",
        "email": email,
        "company_authorized_name": "Elif",
        "company_authorized_surname": "Şahin",
        "is_supplier": is_supplier,
        "is_constructor": is_constructor,
        "password": "correct-horse",
        "password_again": "correct-horse"
    })
}
