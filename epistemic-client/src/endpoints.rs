//! The service's HTTP surface as data.
//!
//! Each [`Endpoint`] knows its verb and path template; the client methods
//! only fill in identifiers and bodies.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    error::{ClientError, Result},
    transport::Method,
};

/// Characters left as-is inside a path segment (RFC 3986 unreserved).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Every operation the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RegisterValidator,
    GetValidator,
    SubmitClaim,
    GetClaim,
    SubmitVote,
    GetVotesForClaim,
    GetConsensusForClaim,
    GetGovernanceParams,
    CreateGovernanceProposal,
    GetLedgerRoot,
    GetHealth,
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::RegisterValidator,
        Endpoint::GetValidator,
        Endpoint::SubmitClaim,
        Endpoint::GetClaim,
        Endpoint::SubmitVote,
        Endpoint::GetVotesForClaim,
        Endpoint::GetConsensusForClaim,
        Endpoint::GetGovernanceParams,
        Endpoint::CreateGovernanceProposal,
        Endpoint::GetLedgerRoot,
        Endpoint::GetHealth,
    ];

    pub fn method(self) -> Method {
        match self {
            Endpoint::RegisterValidator
            | Endpoint::SubmitClaim
            | Endpoint::SubmitVote
            | Endpoint::CreateGovernanceProposal => Method::Post,
            _ => Method::Get,
        }
    }

    /// Path template; `{id}` marks the identifier slot.
    pub fn template(self) -> &'static str {
        match self {
            Endpoint::RegisterValidator => "/validators",
            Endpoint::GetValidator => "/validators/{id}",
            Endpoint::SubmitClaim => "/claims",
            Endpoint::GetClaim => "/claims/{id}",
            Endpoint::SubmitVote => "/votes",
            Endpoint::GetVotesForClaim => "/claims/{id}/votes",
            Endpoint::GetConsensusForClaim => "/validation/claims/{id}/consensus",
            Endpoint::GetGovernanceParams => "/governance/params",
            Endpoint::CreateGovernanceProposal => "/governance/proposals",
            Endpoint::GetLedgerRoot => "/ledger/root",
            Endpoint::GetHealth => "/health",
        }
    }

    pub fn takes_id(self) -> bool {
        self.template().contains("{id}")
    }

    /// Concrete path for an endpoint without an identifier.
    pub fn path(self) -> Result<String> {
        if self.takes_id() {
            return Err(ClientError::InvalidArgument(format!(
                "{:?} requires an identifier",
                self
            )));
        }
        Ok(self.template().to_string())
    }

    /// Concrete path with `id` percent-encoded into its slot.
    pub fn path_with_id(self, id: &str) -> Result<String> {
        if !self.takes_id() {
            return Err(ClientError::InvalidArgument(format!(
                "{:?} does not take an identifier",
                self
            )));
        }
        let id = require("id", id)?;
        Ok(self
            .template()
            .replace("{id}", &utf8_percent_encode(id, SEGMENT).to_string()))
    }
}

/// Reject empty or whitespace-only mandatory fields.
pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(value)
}
