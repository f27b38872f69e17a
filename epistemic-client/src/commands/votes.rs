//! Voting, vote listing and consensus

use anyhow::{bail, Result};

use epistemic_client::{
    clock::{format_timestamp, Clock, SystemClock},
    EpistemicClient, SubmitVote, VoteSigner, VoteType,
};

use super::{print_json, print_success, print_warning};

/// How a vote gets its signature.
pub enum VoteSignature {
    /// Precomputed hex signature
    Provided(String),
    /// Hex secret key to sign with locally
    SigningKey(String),
}

/// Submit a vote
pub async fn submit(
    client: &EpistemicClient,
    claim_id: &str,
    validator_id: &str,
    vote_type: VoteType,
    confidence: f64,
    signature: VoteSignature,
    timestamp: Option<String>,
) -> Result<()> {
    let request = match signature {
        VoteSignature::Provided(signature) => {
            let mut request =
                SubmitVote::new(claim_id, validator_id, vote_type, confidence, signature);
            request.timestamp = timestamp;
            request
        }
        VoteSignature::SigningKey(secret) => {
            // The signature covers the timestamp, so it has to be fixed first.
            let timestamp = timestamp.unwrap_or_else(|| format_timestamp(&SystemClock.now()));
            VoteSigner::from_hex(&secret)?.sign_vote(
                claim_id,
                validator_id,
                vote_type,
                confidence,
                &timestamp,
            )
        }
    };

    let vote = client.submit_vote(request).await?;
    print_success("Vote recorded");
    if vote.signature_valid == Some(false) {
        print_warning("The service could not verify the vote signature");
    }
    print_json(&vote)
}

/// List votes cast on a claim
pub async fn list(client: &EpistemicClient, claim_id: &str) -> Result<()> {
    let votes = client.get_votes_for_claim(claim_id).await?;
    if votes.is_empty() {
        eprintln!("No votes for claim {}", claim_id);
    }
    print_json(&votes)
}

/// Show consensus for a claim
pub async fn consensus(client: &EpistemicClient, claim_id: &str) -> Result<()> {
    let result = client.get_consensus_for_claim(claim_id).await?;
    print_json(&result)
}

/// Generate a validator signing key
pub fn keygen() -> Result<()> {
    let signer = VoteSigner::generate();
    print_json(&serde_json::json!({
        "public_key": signer.public_key_hex(),
        "secret_key": signer.secret_hex(),
    }))
}

/// Pick the signature source from the two mutually exclusive flags.
pub fn signature_source(signature: Option<String>, key: Option<String>) -> Result<VoteSignature> {
    match (signature, key) {
        (Some(signature), None) => Ok(VoteSignature::Provided(signature)),
        (None, Some(key)) => Ok(VoteSignature::SigningKey(key)),
        (Some(_), Some(_)) => bail!("Pass either --signature or --key, not both"),
        (None, None) => bail!("A vote needs --signature or --key"),
    }
}
