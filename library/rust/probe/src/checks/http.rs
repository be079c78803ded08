use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k1s0_resource_cache::ResourceCache;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::outcome::Outcome;
use crate::probe::{Probe, ProbeContext};

const NAME: &str = "http";

/// HTTP GET の応答ステータスで死活を判定する Probe。
///
/// reqwest::Client は URL とタイムアウトの組ごとに ResourceCache で共有し、
/// 接続エラー時は破棄して次回再生成する。
pub struct HttpProbe {
    url: String,
    timeout_ms: u64,
    clients: Arc<ResourceCache<reqwest::Client>>,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, clients: Arc<ResourceCache<reqwest::Client>>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: 5000,
            clients,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// クライアントはタイムアウトを保持するため、キーにもタイムアウトを含める。
    fn cache_key(&self) -> String {
        format!("{}#timeout={}ms", self.url, self.timeout_ms)
    }

    async fn client(&self) -> Result<reqwest::Client, ProbeError> {
        let timeout = Duration::from_millis(self.timeout_ms);
        let client = self
            .clients
            .get_or_create(&self.cache_key(), || async move {
                reqwest::Client::builder().timeout(timeout).build()
            })
            .await?;
        Ok(client)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, ctx: &ProbeContext, cancel: &CancellationToken) -> Result<Outcome, ProbeError> {
        let client = self.client().await?;

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(ProbeError::Cancelled),
            response = client.get(&self.url).send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(ProbeError::Timeout {
                    after: Duration::from_millis(self.timeout_ms),
                });
            }
            Err(e) => {
                if e.is_connect() {
                    self.clients.invalidate(&self.cache_key()).await;
                }
                return Err(ProbeError::Connection(format!("HTTP check failed: {}", e)));
            }
        };

        let status = response.status();
        let outcome = if status.is_success() {
            Outcome::healthy()
        } else {
            ctx.failure(format!("HTTP {} returned status {}", self.url, status))
        };
        Ok(outcome
            .with_data("url", self.url.clone())
            .with_data("status_code", status.as_u16()))
    }
}
