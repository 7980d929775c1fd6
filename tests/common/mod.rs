#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory store and development errors, regardless of the local .env
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_boarding-api"));
        cmd.env("PORT", port.to_string())
            .env("DATABASE_URL", "")
            .env("NODE_ENV", "development")
            .env("PAYMENT_SWEEP_INTERVAL_SECS", "0")
            .env("RUST_LOG", "boarding_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
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

    /// POST /orpc/{resource}/{action}, returning status and JSON body
    pub async fn call(&self, procedure: &str, token: Option<&str>, input: Value) -> Result<(StatusCode, Value)> {
        let path = procedure.replacen('.', "/", 1);
        let mut request = reqwest::Client::new().post(self.url(&format!("/orpc/{}", path))).json(&input);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// Register a landlord in a fresh tenant; returns (token, registration)
    pub async fn landlord(&self, email: &str) -> Result<(String, Value)> {
        let (status, body) = self
            .call(
                "auth.register",
                None,
                json!({ "email": email, "name": "Test Landlord", "role": "landlord" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "register failed: {} {}", status, body);
        let token = body["token"].as_str().context("missing token")?.to_string();
        Ok((token, body))
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
