//! Validator registration and lookup

use anyhow::Result;

use epistemic_client::{EpistemicClient, RegisterValidator};

use super::{print_json, print_success};

/// Register a validator identity
pub async fn register(
    client: &EpistemicClient,
    public_key: &str,
    model_family: &str,
    region: &str,
    domain_focus: Option<String>,
) -> Result<()> {
    let mut request = RegisterValidator::new(public_key, model_family, region);
    request.domain_focus = domain_focus;

    let validator = client.register_validator(&request).await?;
    print_success(&format!("Registered validator {}", validator.id));
    print_json(&validator)
}

/// Show a validator
pub async fn show(client: &EpistemicClient, validator_id: &str) -> Result<()> {
    let validator = client.get_validator(validator_id).await?;
    print_json(&validator)
}
