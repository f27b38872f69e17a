//! Claim submission and lookup

use anyhow::Result;

use epistemic_client::{EpistemicClient, SubmitClaim};

use super::{print_json, print_success};

/// Submit a claim
pub async fn submit(
    client: &EpistemicClient,
    statement: &str,
    domain: &str,
    proposer_id: &str,
    evidence: Vec<String>,
) -> Result<()> {
    let request = SubmitClaim::new(statement, domain, proposer_id).with_evidence(evidence);

    let claim = client.submit_claim(&request).await?;
    print_success(&format!("Submitted claim {}", claim.id));
    print_json(&claim)
}

/// Show a claim
pub async fn show(client: &EpistemicClient, claim_id: &str) -> Result<()> {
    let claim = client.get_claim(claim_id).await?;
    print_json(&claim)
}
