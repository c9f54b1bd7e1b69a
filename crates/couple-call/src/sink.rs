use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use couple_types::signal::SignalMessage;

/// Where outgoing signals go.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, signal: SignalMessage) -> Result<()>;
}

/// Posts signals to the server's relay endpoint.
pub struct HttpSignalSink {
    http: reqwest::Client,
    url: String,
}

impl HttpSignalSink {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building signal HTTP client")?;
        Ok(Self {
            http,
            url: signal_url(base_url),
        })
    }
}

fn signal_url(base_url: &str) -> String {
    format!("{}/api/chat/signal", base_url.trim_end_matches('/'))
}

#[async_trait]
impl SignalSink for HttpSignalSink {
    async fn send(&self, signal: SignalMessage) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&signal)
            .send()
            .await
            .with_context(|| format!("posting {} signal", signal.kind.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("signal relay answered {}: {}", status, detail);
        }
        Ok(())
    }
}
