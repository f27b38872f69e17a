//! Typed client for the epistemic network service.

use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::ClientConfig,
    endpoints::Endpoint,
    error::Result,
    request::{CallOptions, RequestLayer},
    transport::Transport,
    types::{
        Claim, ConsensusResult, CreateProposal, GovernanceParams, GovernanceProposal,
        HealthStatus, LedgerRoot, RegisterValidator, SubmitClaim, SubmitVote, Validator, Vote,
    },
};

/// Client for one service instance.
///
/// Clones share the same configuration and connection pool, so a client can
/// be handed to any number of tasks and used concurrently.
#[derive(Debug, Clone)]
pub struct EpistemicClient {
    layer: RequestLayer,
    clock: Arc<dyn Clock>,
    options: CallOptions,
}

impl EpistemicClient {
    /// Client for `config` over the default HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_layer(RequestLayer::new(config)?))
    }

    /// Client for `config` over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::from_layer(RequestLayer::with_transport(
            config, transport,
        )?))
    }

    fn from_layer(layer: RequestLayer) -> Self {
        Self {
            layer,
            clock: Arc::new(SystemClock),
            options: CallOptions::default(),
        }
    }

    /// Replace the time source used for default vote timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// A handle whose calls use `options` (cancellation, write retries).
    ///
    /// The configuration is shared, not copied.
    pub fn with_options(&self, options: CallOptions) -> Self {
        Self {
            layer: self.layer.clone(),
            clock: self.clock.clone(),
            options,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.layer.config()
    }

    // ========================================================================
    // Validators
    // ========================================================================

    pub async fn register_validator(&self, request: &RegisterValidator) -> Result<Validator> {
        request.validate()?;
        self.post(Endpoint::RegisterValidator, request).await
    }

    pub async fn get_validator(&self, validator_id: &str) -> Result<Validator> {
        self.get_by_id(Endpoint::GetValidator, validator_id).await
    }

    // ========================================================================
    // Claims
    // ========================================================================

    pub async fn submit_claim(&self, request: &SubmitClaim) -> Result<Claim> {
        request.validate()?;
        self.post(Endpoint::SubmitClaim, request).await
    }

    pub async fn get_claim(&self, claim_id: &str) -> Result<Claim> {
        self.get_by_id(Endpoint::GetClaim, claim_id).await
    }

    // ========================================================================
    // Votes & consensus
    // ========================================================================

    /// Submit a vote, stamping it with the current time if it has no
    /// timestamp.
    pub async fn submit_vote(&self, request: SubmitVote) -> Result<Vote> {
        let request = request.stamped(self.clock.now());
        request.validate()?;
        self.post(Endpoint::SubmitVote, &request).await
    }

    /// Votes cast on a claim, in the order the service returns them.
    pub async fn get_votes_for_claim(&self, claim_id: &str) -> Result<Vec<Vote>> {
        self.get_by_id(Endpoint::GetVotesForClaim, claim_id).await
    }

    pub async fn get_consensus_for_claim(&self, claim_id: &str) -> Result<ConsensusResult> {
        self.get_by_id(Endpoint::GetConsensusForClaim, claim_id)
            .await
    }

    // ========================================================================
    // Governance
    // ========================================================================

    pub async fn get_governance_params(&self) -> Result<GovernanceParams> {
        self.get(Endpoint::GetGovernanceParams).await
    }

    pub async fn create_governance_proposal(
        &self,
        request: &CreateProposal,
    ) -> Result<GovernanceProposal> {
        request.validate()?;
        self.post(Endpoint::CreateGovernanceProposal, request).await
    }

    // ========================================================================
    // Ledger & health
    // ========================================================================

    pub async fn get_ledger_root(&self) -> Result<LedgerRoot> {
        self.get(Endpoint::GetLedgerRoot).await
    }

    pub async fn get_health(&self) -> Result<HealthStatus> {
        self.get(Endpoint::GetHealth).await
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    async fn get<T>(&self, endpoint: Endpoint) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let path = endpoint.path()?;
        self.layer
            .execute::<T, ()>(endpoint.method(), &path, None, &self.options)
            .await
    }

    async fn get_by_id<T>(&self, endpoint: Endpoint, id: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let path = endpoint.path_with_id(id)?;
        self.layer
            .execute::<T, ()>(endpoint.method(), &path, None, &self.options)
            .await
    }

    async fn post<T, B>(&self, endpoint: Endpoint, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let path = endpoint.path()?;
        self.layer
            .execute(endpoint.method(), &path, Some(body), &self.options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        error::ClientError,
        transport::{HttpRequest, HttpResponse},
        types::VoteType,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Echoes POST bodies back and answers GETs with a fixed document.
    #[derive(Debug, Default)]
    struct Echo {
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for Echo {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            let body = match &request.body {
                Some(body) => {
                    let mut value: Value = serde_json::from_slice(body).unwrap();
                    value["id"] = json!("srv-1");
                    serde_json::to_vec(&value).unwrap()
                }
                None => br#"{"status":"ok"}"#.to_vec(),
            };
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse { status: 200, body })
        }
    }

    fn client() -> (EpistemicClient, Arc<Echo>) {
        let transport = Arc::new(Echo::default());
        let client =
            EpistemicClient::with_transport(ClientConfig::new("http://hub.test"), transport.clone())
                .unwrap();
        (client, transport)
    }

    #[tokio::test]
    async fn test_submit_vote_uses_injected_clock() {
        let (client, transport) = client();
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let client = client.with_clock(Arc::new(FixedClock(instant)));

        let vote = client
            .submit_vote(SubmitVote::new("c1", "v1", VoteType::Approve, 0.8, "sig"))
            .await
            .unwrap();
        assert_eq!(vote.timestamp, "2024-05-01T12:00:00.000000Z");
        assert_eq!(vote.id.as_deref(), Some("srv-1"));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "http://hub.test/votes");
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_transport() {
        let (client, transport) = client();

        let err = client.get_claim("").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));

        let err = client
            .register_validator(&RegisterValidator::new("k", "", "r"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));

        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_health() {
        let (client, transport) = client();
        let health = client.get_health().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(
            transport.seen.lock().unwrap()[0].url,
            "http://hub.test/health"
        );
    }

    #[test]
    fn test_with_options_shares_config() {
        let (client, _) = client();
        let scoped = client.with_options(CallOptions::new().retry_writes());
        assert!(std::ptr::eq(client.config(), scoped.config()));
    }
}
