//! The `jimini` command line tool.
//!
//! Offline companions to the gateway server: verify an audit chain, lint a
//! rules file, and dry-run a text against a rule set without touching any
//! audit state.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use jimini_core::{Action, Direction, suppress_generic};
use jimini_rules::{RuleSnapshot, frontend};

#[derive(Parser, Debug)]
#[command(name = "jimini", about = "Jimini policy gateway CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify the audit log chain integrity.
    VerifyAudit {
        /// Path to the audit chain file.
        #[arg(long, env = "AUDIT_LOG_PATH", default_value = "logs/audit.jsonl")]
        path: PathBuf,

        /// Also verify record signatures against this public key
        /// (32-byte hex).
        #[arg(long, env = "JIMINI_SIGNING_PUB")]
        signing_pub: Option<PathBuf>,
    },

    /// Validate a rules file without loading it into a server.
    Lint {
        /// Path to the YAML rules file.
        #[arg(long, env = "JIMINI_RULES_PATH", default_value = "policy_rules.yaml")]
        rules: PathBuf,
    },

    /// Evaluate a sample text against a rules file (no audit side effects).
    Test {
        /// Path to the YAML rules file.
        #[arg(long, env = "JIMINI_RULES_PATH", default_value = "policy_rules.yaml")]
        rules: PathBuf,

        /// The text to evaluate.
        #[arg(long)]
        text: String,

        /// Message direction.
        #[arg(long, default_value = "request")]
        direction: Direction,

        /// Caller endpoint.
        #[arg(long, default_value = "/v1/chat")]
        endpoint: String,
    },

    /// Generate an Ed25519 signing keypair for audit record signatures.
    Keygen {
        /// Directory the key files are written into.
        #[arg(long, default_value = "keys")]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::VerifyAudit { path, signing_pub } => {
            let mut report = jimini_audit::verify_chain(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;

            if report.ok {
                if let Some(pub_path) = signing_pub {
                    let verifier = jimini_crypto::RecordVerifier::from_file(&pub_path)
                        .with_context(|| format!("cannot load {}", pub_path.display()))?;
                    report = jimini_audit::verify_signatures(&path, &verifier)?;
                }
            }

            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Lint { rules } => {
            let parsed = frontend::parse_file(&rules)?;
            let snapshot = RuleSnapshot::compile(parsed)?;
            println!(
                "{}: {} rules ok",
                rules.display(),
                snapshot.len()
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::Test {
            rules,
            text,
            direction,
            endpoint,
        } => {
            let parsed = frontend::parse_file(&rules)?;
            let snapshot = RuleSnapshot::compile(parsed)?;

            // Same firing/suppression/precedence path as the server, minus
            // classifier predicates (prompt-only rules need a live server).
            let mut fired: Vec<String> = snapshot
                .iter()
                .filter(|(_, r)| r.in_scope(direction, &endpoint))
                .filter(|(_, r)| r.text_fires(&text))
                .map(|(id, _)| id.clone())
                .collect();
            suppress_generic(&mut fired);

            let action = fired
                .iter()
                .filter_map(|id| snapshot.get(id).map(|r| r.rule.action))
                .max()
                .unwrap_or(Action::Allow);

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "action": action,
                    "rule_ids": fired,
                }))?
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::Keygen { out_dir } => {
            std::fs::create_dir_all(&out_dir)?;
            let (seed_hex, pub_hex) = jimini_crypto::generate_keypair();
            let key_path = out_dir.join("jimini_ed25519.key");
            let pub_path = out_dir.join("jimini_ed25519.pub");
            std::fs::write(&key_path, &seed_hex)?;
            std::fs::write(&pub_path, &pub_hex)?;
            println!("wrote {} and {}", key_path.display(), pub_path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
