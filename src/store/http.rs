use alloy_primitives::Address;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use super::PoolMetadataStore;
use crate::config::RetryConfig;
use crate::error::StoreError;
use crate::models::PoolMetadata;
use crate::utils::{remove_trailing_slash, retry_if};

/// REST client for the persistent pool metadata service.
///
/// `GET  {api_url}/pools/{chain_id}/{token}`  -> metadata, 404 when unknown
/// `POST {api_url}/pools/{chain_id}/batch`    -> `{token: metadata | null}`
pub struct HttpMetadataStore {
    api_url: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    tokens: &'a [Address],
}

impl HttpMetadataStore {
    pub fn new(api_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(api_url, client)
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: remove_trailing_slash(api_url),
            client,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_pool_url(&self, chain_id: u64, token: &Address) -> String {
        format!("{}/pools/{}/0x{}", self.api_url, chain_id, hex::encode(token.as_slice()))
    }

    fn build_batch_url(&self, chain_id: u64) -> String {
        format!("{}/pools/{}/batch", self.api_url, chain_id)
    }

    async fn fetch_pool(
        &self,
        chain_id: u64,
        token: &Address,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        let url = self.build_pool_url(chain_id, token);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = checked_body(response).await?;
        parse_pool(&body)
    }

    async fn fetch_batch(
        &self,
        chain_id: u64,
        tokens: &[Address],
    ) -> Result<HashMap<Address, Option<PoolMetadata>>, StoreError> {
        let url = self.build_batch_url(chain_id);
        let response = self
            .client
            .post(&url)
            .json(&BatchRequest { tokens })
            .send()
            .await
            .map_err(transport_error)?;
        let body = checked_body(response).await?;
        parse_batch(&body, tokens)
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

async fn checked_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(StoreError::RateLimited);
    }
    if status.is_server_error() {
        return Err(StoreError::Unavailable(format!("status {}", status)));
    }
    if !status.is_success() {
        return Err(StoreError::Decode(format!("unexpected status {}", status)));
    }
    response.text().await.map_err(transport_error)
}

fn parse_pool(body: &str) -> Result<Option<PoolMetadata>, StoreError> {
    serde_json::from_str::<Option<PoolMetadata>>(body)
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Tokens the service left out of the response count as not found.
fn parse_batch(
    body: &str,
    tokens: &[Address],
) -> Result<HashMap<Address, Option<PoolMetadata>>, StoreError> {
    let raw: HashMap<String, Option<PoolMetadata>> =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    let mut parsed = HashMap::with_capacity(raw.len());
    for (key, metadata) in raw {
        let token = key
            .parse::<Address>()
            .map_err(|e| StoreError::Decode(format!("bad token key {}: {}", key, e)))?;
        parsed.insert(token, metadata);
    }
    Ok(tokens
        .iter()
        .map(|token| (*token, parsed.remove(token).flatten()))
        .collect())
}

#[async_trait]
impl PoolMetadataStore for HttpMetadataStore {
    async fn get(
        &self,
        token: &Address,
        chain_id: u64,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        retry_if(
            self.retry.max_retries,
            self.retry.base_delay_ms,
            StoreError::is_transient,
            || self.fetch_pool(chain_id, token),
        )
        .await
    }

    async fn get_many(
        &self,
        tokens: &[Address],
        chain_id: u64,
    ) -> Result<HashMap<Address, Option<PoolMetadata>>, StoreError> {
        if tokens.is_empty() {
            return Ok(HashMap::new());
        }
        retry_if(
            self.retry.max_retries,
            self.retry.base_delay_ms,
            StoreError::is_transient,
            || self.fetch_batch(chain_id, tokens),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PoolStatus;

    const POOL_JSON: &str = r#"{
        "pairedToken": {
            "address": "0x0000000000000000000000000000000000000009",
            "decimals": 18,
            "symbol": "WETH"
        },
        "feeTier": 30,
        "tickSpacing": 60,
        "provenance": "indexer",
        "status": "active"
    }"#;

    #[test]
    fn test_urls() {
        let store = HttpMetadataStore::new("http://metadata.local/");
        assert_eq!(store.api_url(), "http://metadata.local");
        assert_eq!(
            store.build_pool_url(1, &Address::with_last_byte(0xab)),
            "http://metadata.local/pools/1/0x00000000000000000000000000000000000000ab"
        );
        assert_eq!(store.build_batch_url(8453), "http://metadata.local/pools/8453/batch");
    }

    #[test]
    fn test_parse_pool() {
        let meta = parse_pool(POOL_JSON).unwrap().unwrap();
        assert_eq!(meta.status, PoolStatus::Active);
        assert!(!meta.has_hook());
        assert!(parse_pool("null").unwrap().is_none());
        assert!(matches!(parse_pool("{\"feeTier\": 1}"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_parse_batch_fills_missing_tokens() {
        let body = format!(
            r#"{{
                "0x0000000000000000000000000000000000000001": {},
                "0x0000000000000000000000000000000000000002": null
            }}"#,
            POOL_JSON
        );
        let tokens = [
            Address::with_last_byte(1),
            Address::with_last_byte(2),
            Address::with_last_byte(3),
        ];
        let parsed = parse_batch(&body, &tokens).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[&tokens[0]].is_some());
        assert!(parsed[&tokens[1]].is_none());
        assert!(parsed[&tokens[2]].is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let store = HttpMetadataStore::new("http://127.0.0.1:1").with_retry(RetryConfig {
            max_retries: 0,
            base_delay_ms: 1,
        });
        let err = store.get(&Address::with_last_byte(1), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
