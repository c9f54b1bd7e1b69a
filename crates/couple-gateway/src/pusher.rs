//! Hosted pub/sub backend: Pusher Channels HTTP trigger API.
//!
//! Requests are signed as documented for the REST API: the query string
//! carries `auth_key`, `auth_timestamp`, `auth_version` and the hex MD5 of
//! the body, and `auth_signature` is the hex HMAC-SHA256 of
//! `"POST\n{path}\n{sorted query}"` under the app secret.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::publisher::Publisher;

/// Pusher rejects event payloads above 10KB.
const MAX_EVENT_BYTES: usize = 10 * 1024;

#[derive(Debug, Clone)]
pub struct PusherConfig {
    pub app_id: String,
    pub key: String,
    pub secret: String,
    pub cluster: String,
}

#[derive(Clone)]
pub struct PusherClient {
    config: PusherConfig,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    /// Pusher wants the event data as a JSON-encoded string.
    data: String,
}

impl PusherClient {
    pub fn new(config: PusherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building Pusher HTTP client")?;
        let base_url = format!("https://api-{}.pusher.com", config.cluster);
        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    /// Point at a Pusher-compatible server (e.g. a self-hosted one).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn trigger(&self, channel: &str, event: &str, data: &Value) -> Result<()> {
        let body = serde_json::to_string(&TriggerBody {
            name: event,
            channels: [channel],
            data: serde_json::to_string(data)?,
        })?;
        if body.len() > MAX_EVENT_BYTES {
            warn!(
                "{} on {} is {} bytes, above Pusher's {} byte limit",
                event,
                channel,
                body.len(),
                MAX_EVENT_BYTES
            );
        }

        let path = format!("/apps/{}/events", self.config.app_id);
        let timestamp = chrono::Utc::now().timestamp();
        let query = signed_query(
            &self.config.key,
            &self.config.secret,
            "POST",
            &path,
            &body,
            timestamp,
        )?;

        let response = self
            .http
            .post(format!("{}{}?{}", self.base_url, path, query))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("sending {} to Pusher", event))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Pusher rejected {} on {}: {} {}", event, channel, status, detail);
        }

        debug!("Pusher accepted {} on {}", event, channel);
        Ok(())
    }
}

#[async_trait]
impl Publisher for PusherClient {
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> Result<()> {
        self.trigger(channel, event, &payload).await
    }
}

/// Build the signed query string for a Pusher REST request.
pub fn signed_query(
    key: &str,
    secret: &str,
    method: &str,
    path: &str,
    body: &str,
    timestamp: i64,
) -> Result<String> {
    let body_md5 = hex::encode(Md5::digest(body.as_bytes()));

    // Parameters must appear in key order in the signed string.
    let params = format!(
        "auth_key={}&auth_timestamp={}&auth_version=1.0&body_md5={}",
        key, timestamp, body_md5
    );
    let to_sign = format!("{}\n{}\n{}", method, path, params);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid Pusher secret: {}", e))?;
    mac.update(to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{}&auth_signature={}", params, signature))
}
