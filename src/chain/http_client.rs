use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::warn;

use crate::errors::ChainError;

use super::types::*;
use super::ChainClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_ATTEMPTS: u32 = 2;

/// HTTP-backed chain client. One pooled `reqwest::Client` shared by every
/// caller (spec.md §5 "Shared resources": 100 idle conns, 100/host, 3s
/// dial, 10s request, 2 retries with 200–250ms jitter), and a dedicated
/// `submit_lock` serializing wallet unlock/submit/lock against this
/// process, since that section is a critical section against the node, not
/// just this service.
pub struct HttpChainClient {
    client: Client,
    node_url: String,
    node_api_key: String,
    wallet_pass: String,
    explorer_url: String,
    submit_lock: Mutex<()>,
}

impl HttpChainClient {
    pub fn new(
        node_url: String,
        node_api_key: String,
        wallet_pass: String,
        explorer_url: String,
    ) -> Result<Self, ChainError> {
        let client = Client::builder()
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(3))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Transient {
                endpoint: "client_builder".to_string(),
                source: e,
            })?;
        Ok(Self {
            client,
            node_url,
            node_api_key,
            wallet_pass,
            explorer_url,
            submit_lock: Mutex::new(()),
        })
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, ChainError> {
        let mut last_err = None;
        for attempt in 0..=RETRY_ATTEMPTS {
            let resp = self
                .client
                .get(url)
                .header("api_key", &self.node_api_key)
                .send()
                .await;
            match resp {
                Ok(r) => return Ok(r),
                Err(e) => {
                    warn!(url, attempt, error = %e, "transient rpc error, retrying");
                    last_err = Some(e);
                    let jitter_ms = rand::thread_rng().gen_range(200..=250);
                    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                }
            }
        }
        Err(ChainError::Transient {
            endpoint: url.to_string(),
            source: last_err.unwrap(),
        })
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn last_height(&self) -> Result<u64, ChainError> {
        let url = format!("{}/blocks/lastHeaders/1", self.node_url);
        let resp = self.get_with_retry(&url).await?;
        let headers: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        headers
            .first()
            .and_then(|h| h.get("height"))
            .and_then(|h| h.as_u64())
            .ok_or_else(|| ChainError::Decode("missing height in lastHeaders response".into()))
    }

    async fn oracle_transactions(
        &self,
        address: &str,
        from_height: u64,
        to_height: u64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ErgTx>, ChainError> {
        let url = format!(
            "{}/api/v1/addresses/{}/transactions?fromHeight={}&toHeight={}&limit={}&offset={}",
            self.explorer_url, address, from_height, to_height, limit, offset
        );
        let resp = self.get_with_retry(&url).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        let items = body
            .get("items")
            .cloned()
            .ok_or_else(|| ChainError::Decode("missing items in explorer response".into()))?;
        serde_json::from_value(items).map_err(|e| ChainError::Decode(e.to_string()))
    }

    async fn get_utxo_box(&self, box_id: &str) -> Result<Option<ErgUtxoBox>, ChainError> {
        let url = format!("{}/utxo/byId/{}", self.node_url, box_id);
        let resp = self.get_with_retry(&url).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(Some(body))
    }

    async fn get_utxo_binary(&self, box_id: &str) -> Result<String, ChainError> {
        let url = format!("{}/utxo/withPool/byIdBinary/{}", self.node_url, box_id);
        let resp = self.get_with_retry(&url).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        body.get("bytes")
            .and_then(|b| b.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ChainError::Decode("missing bytes in byIdBinary response".into()))
    }

    async fn ergo_tree_to_address(&self, ergo_tree_hex: &str) -> Result<String, ChainError> {
        let url = format!("{}/utils/ergoTreeToAddress/{}", self.node_url, ergo_tree_hex);
        let resp = self.get_with_retry(&url).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        body.get("address")
            .and_then(|a| a.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ChainError::Decode("missing address in ergoTreeToAddress response".into()))
    }

    async fn unconfirmed_input_box_ids(&self) -> Result<Vec<String>, ChainError> {
        let url = format!("{}/transactions/unconfirmed", self.node_url);
        let resp = self.get_with_retry(&url).await?;
        let txs: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        let mut ids = Vec::new();
        for tx in txs {
            if let Some(inputs) = tx.get("inputs").and_then(|i| i.as_array()) {
                for input in inputs {
                    if let Some(id) = input.get("boxId").and_then(|b| b.as_str()) {
                        ids.push(id.to_string());
                    }
                }
            }
        }
        Ok(ids)
    }

    async fn submit_result_tx(&self, body: ResultTxBody) -> Result<String, ChainError> {
        // Wallet lock/unlock is a critical section against the node's
        // wallet state, not just this process: serialize submissions.
        let _guard = self.submit_lock.lock().await;

        let unlock_url = format!("{}/wallet/unlock", self.node_url);
        let unlock_resp = self
            .client
            .post(&unlock_url)
            .header("api_key", &self.node_api_key)
            .json(&json!({ "pass": self.wallet_pass }))
            .send()
            .await
            .map_err(|e| ChainError::Transient {
                endpoint: unlock_url.clone(),
                source: e,
            })?;
        if unlock_resp.status() == StatusCode::BAD_REQUEST
            || unlock_resp.status() == StatusCode::UNAUTHORIZED
        {
            return Err(ChainError::WalletLocked);
        }

        let submit_result = self.do_submit(&body).await;

        let lock_url = format!("{}/wallet/lock", self.node_url);
        // Always lock on exit regardless of submit outcome.
        if let Err(e) = self
            .client
            .get(&lock_url)
            .header("api_key", &self.node_api_key)
            .send()
            .await
        {
            warn!(error = %e, "failed to re-lock wallet after submission attempt");
        }

        submit_result
    }
}

impl HttpChainClient {
    async fn do_submit(&self, body: &ResultTxBody) -> Result<String, ChainError> {
        let url = format!("{}/wallet/transaction/send", self.node_url);
        let resp = self
            .client
            .post(&url)
            .header("api_key", &self.node_api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ChainError::Transient {
                endpoint: url.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChainError::SubmitRejected(text));
        }
        resp.text()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))
    }
}
