//! Open Epistemic Network Client
//!
//! A typed client for a regional hub of the Open Epistemic Network:
//! validator registration, claims, signed votes, consensus, governance and
//! the ledger root, each exposed as one async method.
//!
//! ## Request Model
//!
//! - Every call goes through a single request layer that owns the base URL,
//!   per-attempt timeout and retry policy, fixed at construction
//! - Failures surface as a typed [`ClientError`]; nothing panics
//! - Retries are off by default; when enabled, GETs retry automatically and
//!   POSTs only when the caller opts in with [`CallOptions::retry_writes`]
//! - Calls can be cancelled cooperatively with a `CancellationToken`

pub mod client;
pub mod clock;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod request;
pub mod retry;
pub mod signing;
pub mod transport;
pub mod types;

pub use client::EpistemicClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ClientConfig;
pub use endpoints::Endpoint;
pub use error::{ClientError, Result};
pub use request::{CallOptions, RequestLayer};
pub use retry::{Backoff, RetryPolicy};
pub use signing::VoteSigner;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use types::*;

pub use tokio_util::sync::CancellationToken;
