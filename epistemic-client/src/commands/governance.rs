//! Governance parameters and proposals

use anyhow::{anyhow, Result};
use serde_json::Value;

use epistemic_client::{CreateProposal, EpistemicClient};

use super::{print_json, print_success};

/// Show active governance parameters
pub async fn params(client: &EpistemicClient) -> Result<()> {
    let params = client.get_governance_params().await?;
    print_json(&params)
}

/// Create a governance proposal
pub async fn propose(
    client: &EpistemicClient,
    title: &str,
    body: &str,
    overrides: &[String],
    activation_delay_hours: u32,
) -> Result<()> {
    let mut request =
        CreateProposal::new(title, body).with_activation_delay_hours(activation_delay_hours);
    for entry in overrides {
        let (name, value) = parse_override(entry)?;
        request = request.with_parameter(name, value);
    }

    let proposal = client.create_governance_proposal(&request).await?;
    match &proposal.activation_time {
        Some(at) => print_success(&format!("Proposal accepted, activates at {}", at)),
        None => print_success("Proposal accepted"),
    }
    print_json(&proposal)
}

/// Parse `name=value`; the value is read as JSON, falling back to a string.
pub fn parse_override(entry: &str) -> Result<(String, Value)> {
    let (name, raw) = entry
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected name=value, got {:?}", entry))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Parameter name is empty in {:?}", entry));
    }
    let value = serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
