//! Local bot walkthrough
//!
//! Runs the full validator loop against a hub: generate a key, register,
//! submit a claim, cast a signed vote, then list the claim's votes.

use anyhow::Result;
use tracing::info;

use epistemic_client::{
    clock::{format_timestamp, Clock, SystemClock},
    EpistemicClient, RegisterValidator, SubmitClaim, VoteSigner, VoteType,
};

use super::{print_json, print_success};

/// Parameters for a bot run
#[derive(Debug, Clone)]
pub struct BotArgs {
    pub model_family: String,
    pub region: String,
    pub domain: String,
    pub statement: String,
    pub confidence: f64,
}

/// Run the bot flow
pub async fn run(client: &EpistemicClient, args: &BotArgs) -> Result<()> {
    let signer = VoteSigner::generate();
    info!("Generated validator key {}", signer.public_key_hex());

    let validator = client
        .register_validator(
            &RegisterValidator::new(signer.public_key_hex(), &args.model_family, &args.region)
                .with_domain_focus(&args.domain),
        )
        .await?;
    print_success(&format!("Registered validator: {}", validator.id));

    let claim = client
        .submit_claim(&SubmitClaim::new(
            &args.statement,
            &args.domain,
            &validator.id,
        ))
        .await?;
    print_success(&format!("Submitted claim: {}", claim.id));

    let timestamp = format_timestamp(&SystemClock.now());
    let vote = signer.sign_vote(
        &claim.id,
        &validator.id,
        VoteType::Approve,
        args.confidence,
        &timestamp,
    );
    let vote = client.submit_vote(vote).await?;
    print_success(&format!(
        "Submitted vote; signature_valid: {}",
        vote.signature_valid
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    ));

    let votes = client.get_votes_for_claim(&claim.id).await?;
    info!("Claim {} has {} vote(s)", claim.id, votes.len());
    print_json(&votes)
}
