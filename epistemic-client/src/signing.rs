//! Ed25519 vote signing.
//!
//! The service verifies a vote's signature over its canonical message:
//! `claim_id|validator_id|vote_type|confidence|timestamp`, with confidence
//! rendered to six decimal places and the timestamp exactly as sent.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;

use crate::{
    error::{ClientError, Result},
    types::{SubmitVote, VoteType},
};

/// Bytes a validator signs for a vote.
pub fn canonical_vote_message(
    claim_id: &str,
    validator_id: &str,
    vote_type: VoteType,
    confidence: f64,
    timestamp: &str,
) -> Vec<u8> {
    format!(
        "{}|{}|{}|{:.6}|{}",
        claim_id, validator_id, vote_type, confidence, timestamp
    )
    .into_bytes()
}

/// A validator's signing key.
pub struct VoteSigner {
    key: SigningKey,
}

impl VoteSigner {
    /// Generate a fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load a key from its 32-byte hex-encoded seed.
    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        let bytes: [u8; 32] = hex::decode(secret_hex.trim())
            .map_err(|e| ClientError::InvalidArgument(format!("signing key is not hex: {}", e)))?
            .try_into()
            .map_err(|_| ClientError::InvalidArgument("signing key must be 32 bytes".into()))?;

        Ok(Self {
            key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Hex-encoded secret seed.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }

    /// Hex-encoded public key, as registered with the service.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }

    /// Hex-encoded signature over `message`.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.key.sign(message).to_bytes())
    }

    /// Build a signed vote stamped at `timestamp`.
    ///
    /// The timestamp is fixed here because the signature covers it.
    pub fn sign_vote(
        &self,
        claim_id: &str,
        validator_id: &str,
        vote_type: VoteType,
        confidence: f64,
        timestamp: &str,
    ) -> SubmitVote {
        let message =
            canonical_vote_message(claim_id, validator_id, vote_type, confidence, timestamp);
        let mut vote = SubmitVote::new(
            claim_id,
            validator_id,
            vote_type,
            confidence,
            self.sign_hex(&message),
        );
        vote.timestamp = Some(timestamp.to_string());
        vote
    }
}

impl std::fmt::Debug for VoteSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteSigner")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Check a hex signature against a hex public key.
pub fn verify_hex(public_key_hex: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(key_bytes) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    key.verify(message, &signature).is_ok()
}
