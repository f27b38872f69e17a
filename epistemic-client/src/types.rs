//! Request and response types exchanged with the service.
//!
//! Identifiers are opaque strings; the client never rewrites them.
//! Response types accept the extra fields the service reports without
//! requiring them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{
    clock::format_timestamp,
    endpoints::require,
    error::{ClientError, Result},
};

/// Offset-less ISO-8601 date-time, fractional seconds optional.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Default delay before an accepted proposal takes effect.
pub const DEFAULT_ACTIVATION_DELAY_HOURS: u32 = 24;

// ============================================================================
// Validators
// ============================================================================

/// A registered validator identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub id: String,
    pub public_key: String,
    pub model_family: String,
    pub region: String,
    #[serde(default)]
    pub domain_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Body of `POST /validators`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValidator {
    /// Ed25519 public key, hex or base64
    pub public_key: String,
    /// Model family identifier, e.g. "llama"
    pub model_family: String,
    /// Geographic or jurisdictional region code
    pub region: String,
    /// Optional specialization; sent as `null` when absent
    pub domain_focus: Option<String>,
}

impl RegisterValidator {
    pub fn new(
        public_key: impl Into<String>,
        model_family: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            model_family: model_family.into(),
            region: region.into(),
            domain_focus: None,
        }
    }

    pub fn with_domain_focus(mut self, domain_focus: impl Into<String>) -> Self {
        self.domain_focus = Some(domain_focus.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("public_key", &self.public_key)?;
        require("model_family", &self.model_family)?;
        require("region", &self.region)?;
        Ok(())
    }
}

// ============================================================================
// Claims
// ============================================================================

/// A claim recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub statement: String,
    pub domain: String,
    pub proposer_id: String,
    /// Evidence URLs, in submission order
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<String>,
}

/// Body of `POST /claims`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitClaim {
    pub statement: String,
    pub domain: String,
    pub proposer_id: String,
    /// Sent as `[]` when empty
    pub evidence_refs: Vec<String>,
}

impl SubmitClaim {
    pub fn new(
        statement: impl Into<String>,
        domain: impl Into<String>,
        proposer_id: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            domain: domain.into(),
            proposer_id: proposer_id.into(),
            evidence_refs: Vec::new(),
        }
    }

    /// Append evidence references, keeping their order.
    pub fn with_evidence<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evidence_refs.extend(refs.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("statement", &self.statement)?;
        require("domain", &self.domain)?;
        require("proposer_id", &self.proposer_id)?;
        if let Some(idx) = self.evidence_refs.iter().position(|r| r.trim().is_empty()) {
            return Err(ClientError::InvalidArgument(format!(
                "evidence_refs[{}] must not be empty",
                idx
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Votes
// ============================================================================

/// A validator's verdict on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Approve,
    Reject,
    Uncertain,
}

impl VoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Approve => "approve",
            VoteType::Reject => "reject",
            VoteType::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(VoteType::Approve),
            "reject" => Ok(VoteType::Reject),
            "uncertain" => Ok(VoteType::Uncertain),
            other => Err(ClientError::InvalidArgument(format!(
                "unknown vote type {:?} (expected approve, reject or uncertain)",
                other
            ))),
        }
    }
}

/// A vote as recorded by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub claim_id: String,
    pub validator_id: String,
    pub vote_type: VoteType,
    pub confidence: f64,
    pub timestamp: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_valid: Option<bool>,
}

/// Body of `POST /votes`.
///
/// A missing `timestamp` is filled in by the client when the call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitVote {
    pub claim_id: String,
    pub validator_id: String,
    pub vote_type: VoteType,
    /// Expected within `[0, 1]`
    pub confidence: f64,
    pub timestamp: Option<String>,
    /// Hex-encoded signature over the canonical vote message
    pub signature: String,
}

impl SubmitVote {
    pub fn new(
        claim_id: impl Into<String>,
        validator_id: impl Into<String>,
        vote_type: VoteType,
        confidence: f64,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            validator_id: validator_id.into(),
            vote_type,
            confidence,
            timestamp: None,
            signature: signature.into(),
        }
    }

    /// Pin the vote to `instant`.
    pub fn at(mut self, instant: DateTime<Utc>) -> Self {
        self.timestamp = Some(format_timestamp(&instant));
        self
    }

    /// Fill the timestamp with `now` unless the caller already set one.
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        if self.timestamp.is_none() {
            self.timestamp = Some(format_timestamp(&now));
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("claim_id", &self.claim_id)?;
        require("validator_id", &self.validator_id)?;
        require("signature", &self.signature)?;
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ClientError::InvalidArgument(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        if let Some(timestamp) = &self.timestamp {
            check_iso8601(timestamp)?;
        }
        Ok(())
    }
}

/// Accept RFC 3339 instants and offset-less local date-times.
fn check_iso8601(timestamp: &str) -> Result<()> {
    if DateTime::parse_from_rfc3339(timestamp).is_ok() {
        return Ok(());
    }
    NaiveDateTime::parse_from_str(timestamp, NAIVE_TIMESTAMP_FORMAT)
        .map(|_| ())
        .map_err(|e| ClientError::InvalidArgument(format!("timestamp {:?}: {}", timestamp, e)))
}

// ============================================================================
// Consensus
// ============================================================================

/// Outcome of a consensus round for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub claim_id: String,
    pub round: u64,
    /// "accepted", "rejected", or absent while undecided
    #[serde(default)]
    pub outcome: Option<String>,
    pub confidence: f64,
    pub created_at: String,
}

// ============================================================================
// Governance
// ============================================================================

/// Active governance parameters.
///
/// Parameters may arrive nested under `parameters` or flat beside
/// `version`; [`GovernanceParams::get`] looks in both places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceParams {
    pub version: Value,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GovernanceParams {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name).or_else(|| self.extra.get(name))
    }
}

/// Body of `POST /governance/proposals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProposal {
    pub title: String,
    pub body: String,
    /// Overrides for named parameters; sent as `{}` when empty
    pub parameters_diff: BTreeMap<String, Value>,
    pub activation_delay_hours: u32,
}

impl CreateProposal {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            parameters_diff: BTreeMap::new(),
            activation_delay_hours: DEFAULT_ACTIVATION_DELAY_HOURS,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters_diff.insert(name.into(), value.into());
        self
    }

    pub fn with_activation_delay_hours(mut self, hours: u32) -> Self {
        self.activation_delay_hours = hours;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require("body", &self.body)?;
        if self.activation_delay_hours == 0 {
            return Err(ClientError::InvalidArgument(
                "activation_delay_hours must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A proposal as acknowledged by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceProposal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_diff: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_delay_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_time: Option<String>,
}

// ============================================================================
// Ledger & health
// ============================================================================

/// Latest ledger Merkle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRoot {
    /// Absent while the ledger is empty
    #[serde(default, alias = "root_hash")]
    pub merkle_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<u64>,
}

/// Service liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
