#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use medicine_delivery_api::auth::password::hash_password_with_rounds;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "integration-test-password";
pub const SECRET_KEY: &str = "integration-test-secret-0123456789abcdef";

/// A server process on its own port and data file; killed on drop
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub data_file: PathBuf,
    child: Child,
}

impl TestServer {
    /// Start a server with a fresh, empty data file
    pub async fn start() -> Result<Self> {
        let dir = std::env::temp_dir().join(format!("medicine-delivery-it-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).context("failed to create scratch dir")?;
        Self::start_with_data_file(&dir.join("deliveries.json")).await
    }

    /// Start a server on an existing (or not yet existing) data file
    pub async fn start_with_data_file(data_file: &Path) -> Result<Self> {
        let server = Self::spawn(data_file)?;
        server.wait_ready(Duration::from_secs(15)).await?;
        Ok(server)
    }

    fn spawn(data_file: &Path) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let password_hash = hash_password_with_rounds(ADMIN_PASSWORD, 1_000)?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_medicine-delivery-api"));
        cmd.env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("SECRET_KEY", SECRET_KEY)
            .env("ADMIN_USERNAME", ADMIN_USER)
            .env("ADMIN_PASSWORD_HASH", password_hash)
            .env("DATA_FILE", data_file)
            .env("ACCESS_TOKEN_EXPIRE_MINUTES", "30")
            .env("API_ENABLE_REQUEST_LOGGING", "false")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            data_file: data_file.to_path_buf(),
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in as the admin and return the bearer token
    pub async fn login(&self, client: &reqwest::Client) -> Result<String> {
        let res = client
            .post(self.url("/login"))
            .json(&json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed with {}", res.status());

        let body = res.json::<Value>().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access_token")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
