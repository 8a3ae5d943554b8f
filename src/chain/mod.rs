//! Chain client façade (C1): an opaque collaborator over the node +
//! explorer RPC surface listed in spec.md §6.1. The trait boundary is the
//! "interface in §6" the spec treats this component as external to; the
//! HTTP implementation is ambient plumbing grounded on the pooled,
//! retrying `reqwest::Client` pattern the rest of the pack reaches for.

pub mod http_client;
pub mod memory;
pub mod types;

use async_trait::async_trait;

use crate::errors::ChainError;
pub use http_client::HttpChainClient;
pub use memory::InMemoryChainClient;
pub use types::*;

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn last_height(&self) -> Result<u64, ChainError>;

    async fn oracle_transactions(
        &self,
        address: &str,
        from_height: u64,
        to_height: u64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ErgTx>, ChainError>;

    /// `None` models the node's 404-means-spent convention (spec.md §6.1).
    async fn get_utxo_box(&self, box_id: &str) -> Result<Option<ErgUtxoBox>, ChainError>;

    async fn get_utxo_binary(&self, box_id: &str) -> Result<String, ChainError>;

    async fn ergo_tree_to_address(&self, ergo_tree_hex: &str) -> Result<String, ChainError>;

    /// Box ids currently referenced as inputs by an unconfirmed (mempool)
    /// transaction — used to recover from a crash mid-submission (spec.md
    /// §9 open question ii) instead of blindly resubmitting.
    async fn unconfirmed_input_box_ids(&self) -> Result<Vec<String>, ChainError>;

    /// Unlock, submit, always lock on exit regardless of outcome
    /// (spec.md §4.5.1 step 7). Implementations must serialize this against
    /// concurrent callers (spec.md §5 "Shared resources").
    async fn submit_result_tx(&self, body: ResultTxBody) -> Result<String, ChainError>;
}
