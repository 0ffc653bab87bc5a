use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Estado {
    pub id: u32,
    pub nome: String,
    pub sigla: String,
}

/// Geography lookups proxied to the remote REST API. Implementations
/// never surface upstream failures; they degrade to the embedded
/// fallback dataset instead.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn estados(&self) -> Vec<Estado>;
}

#[derive(Debug, Deserialize)]
struct UpstreamToken {
    token: String,
}

/// Client for the remote API: logs in with a service credential, caches
/// the bearer token and retries once on a 401.
pub struct HttpUpstream {
    http: reqwest::Client,
    config: UpstreamConfig,
    token: RwLock<Option<String>>,
}

impl HttpUpstream {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token: RwLock::new(None),
        }
    }

    async fn login(&self) -> anyhow::Result<String> {
        let response = self
            .http
            .post(format!("{}/auth/login", self.config.base_url))
            .json(&json!({ "email": self.config.email, "senha": self.config.senha }))
            .send()
            .await?
            .error_for_status()?;
        let body: UpstreamToken = response.json().await?;
        *self.token.write().await = Some(body.token.clone());
        debug!("upstream login ok");
        Ok(body.token)
    }

    async fn bearer(&self) -> anyhow::Result<String> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.login().await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let token = self.bearer().await?;
        let url = format!("{}{}", self.config.base_url, path);
        let response = self.http.get(&url).bearer_auth(&token).send().await?;

        // expired service token: re-login once and retry
        let response = if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            let token = self.login().await?;
            self.http.get(&url).bearer_auth(&token).send().await?
        } else {
            response
        };

        Ok(response.error_for_status()?.json().await?)
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn estados(&self) -> Vec<Estado> {
        match self.get_json("/estados").await {
            Ok(estados) => estados,
            Err(e) => {
                warn!(error = %e, "upstream unavailable, serving fallback dataset");
                fallback_estados()
            }
        }
    }
}

/// Embedded degraded-mode dataset, served whenever the remote API is
/// unreachable or answers with an error.
pub fn fallback_estados() -> Vec<Estado> {
    [
        (35, "São Paulo", "SP"),
        (33, "Rio de Janeiro", "RJ"),
        (31, "Minas Gerais", "MG"),
        (41, "Paraná", "PR"),
        (43, "Rio Grande do Sul", "RS"),
        (29, "Bahia", "BA"),
    ]
    .into_iter()
    .map(|(id, nome, sigla)| Estado {
        id,
        nome: nome.to_string(),
        sigla: sigla.to_string(),
    })
    .collect()
}

/// Offline implementation used by tests and local development; always
/// serves the fallback dataset.
pub struct StaticUpstream;

#[async_trait]
impl UpstreamClient for StaticUpstream {
    async fn estados(&self) -> Vec<Estado> {
        fallback_estados()
    }
}
