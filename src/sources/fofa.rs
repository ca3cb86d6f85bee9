use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{SearchSource, SourceKind};
use crate::config::ScannerConfig;
use crate::error::SourceError;
use crate::http_client::create_api_client;
use crate::normalize::{self, NormalizedRecord};
use crate::target::Target;

/// Column order of every FOFA result tuple.
pub const FOFA_FIELDS: &str = "host,ip,domain,port,protocol,title,server,banner,cert,header,body";

#[derive(Debug, Deserialize)]
struct FofaEnvelope {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    errmsg: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

pub struct FofaSource {
    client: Client,
    endpoint: String,
    email: String,
    key: String,
    page_size: u32,
}

impl FofaSource {
    pub fn new(config: &ScannerConfig) -> reqwest::Result<Self> {
        let client = create_api_client(config.request_timeout(), config.max_workers.max(8))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/v1/search/all", config.fofa_base_url.trim_end_matches('/')),
            email: config.fofa_email.clone(),
            key: config.fofa_key.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl SearchSource for FofaSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Fofa
    }

    async fn execute(&self, query: &str) -> Result<Vec<Value>, SourceError> {
        let qbase64 = base64::engine::general_purpose::STANDARD.encode(query.as_bytes());
        let size = self.page_size.to_string();
        let params = [
            ("email", self.email.as_str()),
            ("key", self.key.as_str()),
            ("qbase64", qbase64.as_str()),
            ("page", "1"),
            ("size", size.as_str()),
            ("fields", FOFA_FIELDS),
        ];

        let resp = self.client.get(&self.endpoint).query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16() });
        }

        let body = resp.text().await?;
        let envelope: FofaEnvelope =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;
        if envelope.error {
            let message = envelope.errmsg.unwrap_or_else(|| "Unknown FOFA error".to_string());
            return Err(SourceError::Service(message));
        }

        tracing::debug!(query, results = envelope.results.len(), "FOFA query succeeded");
        Ok(envelope.results)
    }

    fn normalize(&self, target: &Target, item: &Value, captured_at: &str) -> Option<NormalizedRecord> {
        normalize::fofa::normalize_item(target, item, captured_at)
    }
}
