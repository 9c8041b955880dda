//! HTTP page fetcher for the devices endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use camdex_core::{
    EffectiveConfig, IndexError, Page, PageFetcher, Result, DEFAULT_TIMEOUT_SECS, MAX_PAGE_SIZE,
};

use crate::page::decode_page;

const DEVICES_PATH: &str = "/cameras/v1/devices";
const API_KEY_HEADER: &str = "x-api-key";
const TOKEN_HEADER: &str = "x-verkada-auth";

/// Fetches camera pages over HTTP with profile credentials.
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    endpoint: Url,
    headers: BTreeMap<String, String>,
}

impl HttpPageFetcher {
    /// Create a fetcher for `base_url`.
    ///
    /// Extra `headers` are sent first; the API key and token only fill
    /// headers not already present.
    pub fn new(
        base_url: &str,
        api_key: &str,
        token: &str,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}{}", base, DEVICES_PATH))
            .map_err(|e| IndexError::config(format!("Invalid base URL {:?}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("camdex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IndexError::http(format!("Failed to build HTTP client: {}", e)))?;

        let mut all_headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.clone()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        for (name, value) in [(API_KEY_HEADER, api_key), (TOKEN_HEADER, token)] {
            let value = value.trim();
            if !value.is_empty() {
                all_headers
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        Ok(Self {
            client,
            endpoint,
            headers: all_headers,
        })
    }

    /// Create a fetcher from resolved profile settings.
    pub fn from_config(config: &EffectiveConfig) -> Result<Self> {
        let profile = &config.profile;
        Self::new(
            &profile.base_url,
            &profile.auth.api_key,
            &profile.auth.token,
            &profile.headers,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Devices endpoint this fetcher targets.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, page_token: &str, page_size: u32) -> Result<Page> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let mut request = self
            .client
            .get(self.endpoint.clone())
            .query(&[("page_size", page_size.to_string())]);
        if !page_token.is_empty() {
            request = request.query(&[("page_token", page_token)]);
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!("GET {} (page_token={:?})", self.endpoint, page_token);

        let response = request
            .send()
            .await
            .map_err(|e| IndexError::http(format!("Failed to reach {}: {}", self.endpoint, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| IndexError::http(format!("Failed to read response body: {}", e)))?;

        decode_page(status, &content_type, &body)
    }
}
