//! Health and ledger root

use anyhow::Result;

use epistemic_client::EpistemicClient;

use super::{print_json, print_warning};

/// Check service health
pub async fn health(client: &EpistemicClient) -> Result<()> {
    let health = client.get_health().await?;
    if !health.is_ok() {
        print_warning(&format!("Service reports status {:?}", health.status));
    }
    print_json(&health)
}

/// Show the latest ledger Merkle root
pub async fn ledger_root(client: &EpistemicClient) -> Result<()> {
    let root = client.get_ledger_root().await?;
    if root.merkle_root.is_none() {
        print_warning("Ledger is empty");
    }
    print_json(&root)
}
