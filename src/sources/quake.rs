use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{SearchSource, SourceKind};
use crate::config::ScannerConfig;
use crate::error::SourceError;
use crate::http_client::create_api_client;
use crate::normalize::{self, NormalizedRecord};
use crate::target::Target;

pub const QUAKE_FIELDS: &str = "service.http.title,service.http.host,service.http.server,service.name,\
service.http.status_code,service.cert,service.version,service.http.body,ip,port,domain,\
transport,service.http.favicon.hash,service.http.favicon.data,service.http.response";

#[derive(Debug, Deserialize)]
struct QuakeEnvelope {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

pub struct QuakeSource {
    client: Client,
    endpoint: String,
    token: String,
    page_size: u32,
}

impl QuakeSource {
    pub fn new(config: &ScannerConfig) -> reqwest::Result<Self> {
        let client = create_api_client(config.request_timeout(), config.max_workers.max(8))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/v3/search/quake_service", config.quake_base_url.trim_end_matches('/')),
            token: config.quake_api_key.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl SearchSource for QuakeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Quake
    }

    async fn execute(&self, query: &str) -> Result<Vec<Value>, SourceError> {
        let body = json!({
            "query": query,
            "start": 0,
            "size": self.page_size,
            "ignore_cache": false,
            "latest": true,
            "fields": QUAKE_FIELDS,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-QuakeToken", &self.token)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16() });
        }

        let text = resp.text().await?;
        let envelope: QuakeEnvelope =
            serde_json::from_str(&text).map_err(|e| SourceError::Decode(e.to_string()))?;
        if envelope.code.as_i64() != Some(0) {
            let message = envelope.message.unwrap_or_else(|| "Unknown Quake error".to_string());
            return Err(SourceError::Service(message));
        }

        let items = match envelope.data {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        tracing::debug!(query, results = items.len(), "Quake query succeeded");
        Ok(items)
    }

    fn normalize(&self, target: &Target, item: &Value, captured_at: &str) -> Option<NormalizedRecord> {
        normalize::quake::normalize_item(target, item, captured_at)
    }
}
