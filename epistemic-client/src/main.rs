//! Open Epistemic Network CLI
//!
//! Command-line access to a regional hub: validators, claims, votes,
//! consensus, governance and the ledger.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epistemic_client::{CancellationToken, VoteType};

mod commands;

use commands::{bot::BotArgs, ConnectionArgs};

#[derive(Parser)]
#[command(name = "epistemic")]
#[command(about = "Open Epistemic Network client - talk to a regional hub")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.epistemic/client.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hub base URL, overrides the configuration file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Retries for idempotent requests
    #[arg(long, global = true)]
    retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check hub health
    Health,

    /// Register a validator
    RegisterValidator {
        /// Ed25519 public key (hex)
        public_key: String,

        /// Model family, e.g. "llama"
        model_family: String,

        /// Region code
        region: String,

        /// Domain specialization
        #[arg(long)]
        domain_focus: Option<String>,
    },

    /// Show a validator
    Validator {
        /// Validator ID
        id: String,
    },

    /// Submit a claim
    SubmitClaim {
        /// Claim statement
        statement: String,

        /// Knowledge domain
        domain: String,

        /// Proposer validator ID
        proposer_id: String,

        /// Evidence URL (repeatable, order is kept)
        #[arg(short, long = "evidence")]
        evidence: Vec<String>,
    },

    /// Show a claim
    Claim {
        /// Claim ID
        id: String,
    },

    /// Cast a vote on a claim
    Vote {
        /// Claim ID
        claim_id: String,

        /// Voting validator ID
        validator_id: String,

        /// approve, reject or uncertain
        vote_type: VoteType,

        /// Confidence between 0 and 1
        confidence: f64,

        /// Precomputed hex signature
        #[arg(long)]
        signature: Option<String>,

        /// Hex secret key to sign the vote with locally
        #[arg(long)]
        key: Option<String>,

        /// ISO-8601 timestamp (default: now)
        #[arg(long)]
        timestamp: Option<String>,
    },

    /// List votes on a claim
    Votes {
        /// Claim ID
        claim_id: String,
    },

    /// Show consensus for a claim
    Consensus {
        /// Claim ID
        claim_id: String,
    },

    /// Show governance parameters
    GovernanceParams,

    /// Create a governance proposal
    Propose {
        /// Proposal title
        title: String,

        /// Proposal body
        body: String,

        /// Parameter override as name=value (repeatable)
        #[arg(long = "set")]
        overrides: Vec<String>,

        /// Hours before the change activates
        #[arg(long, default_value = "24")]
        activation_delay_hours: u32,
    },

    /// Show the ledger Merkle root
    LedgerRoot,

    /// Generate a validator signing key
    Keygen,

    /// Register, claim, vote and list votes in one run
    Bot {
        #[arg(long, default_value = "example-model")]
        model_family: String,

        #[arg(long, default_value = "eu")]
        region: String,

        #[arg(long, default_value = "demo")]
        domain: String,

        #[arg(long, default_value = "Example claim from local bot")]
        statement: String,

        #[arg(long, default_value = "0.8")]
        confidence: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Commands::Keygen = cli.command {
        return commands::votes::keygen();
    }

    // Ctrl-C abandons whatever call is in flight
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let connection = ConnectionArgs {
        config: cli.config,
        base_url: cli.base_url,
        timeout_ms: cli.timeout_ms,
        retries: cli.retries,
    };
    let client = commands::connect(&connection, cancel)?;

    match cli.command {
        Commands::Health => commands::status::health(&client).await,
        Commands::RegisterValidator {
            public_key,
            model_family,
            region,
            domain_focus,
        } => {
            commands::validators::register(&client, &public_key, &model_family, &region, domain_focus)
                .await
        }
        Commands::Validator { id } => commands::validators::show(&client, &id).await,
        Commands::SubmitClaim {
            statement,
            domain,
            proposer_id,
            evidence,
        } => commands::claims::submit(&client, &statement, &domain, &proposer_id, evidence).await,
        Commands::Claim { id } => commands::claims::show(&client, &id).await,
        Commands::Vote {
            claim_id,
            validator_id,
            vote_type,
            confidence,
            signature,
            key,
            timestamp,
        } => {
            let signature = commands::votes::signature_source(signature, key)?;
            commands::votes::submit(
                &client,
                &claim_id,
                &validator_id,
                vote_type,
                confidence,
                signature,
                timestamp,
            )
            .await
        }
        Commands::Votes { claim_id } => commands::votes::list(&client, &claim_id).await,
        Commands::Consensus { claim_id } => commands::votes::consensus(&client, &claim_id).await,
        Commands::GovernanceParams => commands::governance::params(&client).await,
        Commands::Propose {
            title,
            body,
            overrides,
            activation_delay_hours,
        } => {
            commands::governance::propose(&client, &title, &body, &overrides, activation_delay_hours)
                .await
        }
        Commands::LedgerRoot => commands::status::ledger_root(&client).await,
        Commands::Keygen => commands::votes::keygen(),
        Commands::Bot {
            model_family,
            region,
            domain,
            statement,
            confidence,
        } => {
            let args = BotArgs {
                model_family,
                region,
                domain,
                statement,
                confidence,
            };
            commands::bot::run(&client, &args).await
        }
    }
}
