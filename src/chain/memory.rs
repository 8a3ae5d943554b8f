use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::ChainError;

use super::types::*;
use super::ChainClient;

/// In-memory `ChainClient` double for unit/scenario tests: a fixed height,
/// a set of oracle transactions, and a mutable box table so tests can model
/// a bet box being spent mid-scenario.
#[derive(Default)]
pub struct InMemoryChainClient {
    pub height: Mutex<u64>,
    pub oracle_txs: Mutex<Vec<ErgTx>>,
    pub boxes: Mutex<HashMap<String, ErgUtxoBox>>,
    pub ergo_tree_addresses: Mutex<HashMap<String, String>>,
    pub submitted: Mutex<Vec<ResultTxBody>>,
    pub submit_should_fail: Mutex<bool>,
    pub unconfirmed_inputs: Mutex<Vec<String>>,
}

impl InMemoryChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spend_box(&self, box_id: &str) {
        self.boxes.lock().unwrap().remove(box_id);
    }
}

#[async_trait]
impl ChainClient for InMemoryChainClient {
    async fn last_height(&self) -> Result<u64, ChainError> {
        Ok(*self.height.lock().unwrap())
    }

    async fn oracle_transactions(
        &self,
        _address: &str,
        from_height: u64,
        to_height: u64,
        _limit: u32,
        offset: u32,
    ) -> Result<Vec<ErgTx>, ChainError> {
        if offset > 0 {
            return Ok(Vec::new());
        }
        let txs = self.oracle_txs.lock().unwrap();
        Ok(txs
            .iter()
            .filter(|t| t.inclusion_height > from_height && t.inclusion_height <= to_height)
            .cloned()
            .collect())
    }

    async fn get_utxo_box(&self, box_id: &str) -> Result<Option<ErgUtxoBox>, ChainError> {
        Ok(self.boxes.lock().unwrap().get(box_id).cloned())
    }

    async fn get_utxo_binary(&self, box_id: &str) -> Result<String, ChainError> {
        Ok(hex::encode(box_id.as_bytes()))
    }

    async fn ergo_tree_to_address(&self, ergo_tree_hex: &str) -> Result<String, ChainError> {
        self.ergo_tree_addresses
            .lock()
            .unwrap()
            .get(ergo_tree_hex)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(ergo_tree_hex.to_string()))
    }

    async fn unconfirmed_input_box_ids(&self) -> Result<Vec<String>, ChainError> {
        Ok(self.unconfirmed_inputs.lock().unwrap().clone())
    }

    async fn submit_result_tx(&self, body: ResultTxBody) -> Result<String, ChainError> {
        if *self.submit_should_fail.lock().unwrap() {
            return Err(ChainError::SubmitRejected("mock rejection".into()));
        }
        let tx_id = format!("mocktx-{}", self.submitted.lock().unwrap().len());
        self.submitted.lock().unwrap().push(body);
        Ok(tx_id)
    }
}
