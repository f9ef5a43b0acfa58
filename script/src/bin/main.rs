//! MPT proof verification from the command line.
//!
//! You can run this script using the following command:
//! ```shell
//! RUST_LOG=debug cargo run --release -- verify --input proof.json
//! ```
//! or, for a receipts-trie proof:
//! ```shell
//! cargo run --release -- receipt --input receipt.json --tx-index 7 \
//!     --emitter 0x2796cAaDC53f5d907332a2573F20DF23eA57C687 \
//!     --event 'Transfer(address,address,uint256)'
//! ```

use std::path::PathBuf;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolValue;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mpt_verifier::{
    keccak256, receipt_trie_key, LogFilter, MPTProofInput, MPTVerificationResult, ProofNodes,
    ProofVerificationOutput, Receipt,
};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// The arguments for the command.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify a proof and report the proven value or exclusion.
    Verify(VerifyArgs),
    /// Verify a receipts-trie proof and scan the receipt's logs.
    Receipt(ReceiptArgs),
}

#[derive(Args, Debug)]
struct ProofArgs {
    /// JSON file holding `root`, `key` and `proof`.
    #[arg(long, env = "MPT_PROOF_INPUT", conflicts_with_all = ["root", "key", "nodes", "proof_rlp"])]
    input: Option<PathBuf>,

    /// Trusted trie root.
    #[arg(long)]
    root: Option<B256>,

    /// Raw trie key, hex.
    #[arg(long)]
    key: Option<Bytes>,

    /// One RLP-encoded proof node, root first. Repeat for each node.
    #[arg(long = "node")]
    nodes: Vec<Bytes>,

    /// The whole proof as one RLP list of nodes.
    #[arg(long, conflicts_with = "nodes")]
    proof_rlp: Option<Bytes>,

    /// Hash the key with Keccak-256 first, as state and storage tries do.
    #[arg(long)]
    secure: bool,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[command(flatten)]
    proof: ProofArgs,

    /// Fail unless the proof includes exactly this value.
    #[arg(long)]
    expect: Option<Bytes>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Args, Debug)]
struct ReceiptArgs {
    #[command(flatten)]
    proof: ProofArgs,

    /// Transaction index in the block; the key becomes `rlp(index)`.
    #[arg(long, conflicts_with = "key")]
    tx_index: Option<u64>,

    /// Only report logs emitted by this contract.
    #[arg(long, env = "MPT_EMITTER")]
    emitter: Option<Address>,

    /// Only report logs of this event, e.g. `Transfer(address,address,uint256)`.
    #[arg(long, env = "MPT_EVENT", requires = "emitter")]
    event: Option<String>,

    #[arg(long, value_enum, default_value_t = ReceiptFormat::Text)]
    format: ReceiptFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    /// ABI-encoded `ProofVerificationOutput`, hex.
    Abi,
}

/// Receipt reports have no ABI form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReceiptFormat {
    Text,
    Json,
}

impl ProofArgs {
    fn load(&self, key: Option<Vec<u8>>) -> Result<MPTProofInput> {
        let mut input = match &self.input {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str::<MPTProofInput>(&text)
                    .with_context(|| format!("failed to parse proof input {}", path.display()))?
            }
            None => MPTProofInput {
                root: self.root.context("--root is required without --input")?,
                key: self.key.clone().unwrap_or_default(),
                proof: match &self.proof_rlp {
                    Some(proof) => ProofNodes::Rlp(proof.clone()),
                    None => ProofNodes::Nodes(self.nodes.clone()),
                },
            },
        };

        if let Some(key) = key {
            input.key = key.into();
        }
        if self.secure {
            input.key = Bytes::copy_from_slice(&keccak256(&input.key));
        }
        debug!(root = %hex0x(input.root.as_slice()), key = %hex0x(&input.key), "loaded proof input");
        Ok(input)
    }
}

fn hex0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn print_result(result: &MPTVerificationResult, format: Format) -> Result<()> {
    match format {
        Format::Text => {
            println!("Root: {}", hex0x(result.root.as_slice()));
            println!("Key: {}", hex0x(&result.key));
            match result.exclusion {
                None => println!("Included: {}", hex0x(&result.value)),
                Some(reason) => println!("Excluded: {reason:?}"),
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(result)?),
        Format::Abi => {
            let output = ProofVerificationOutput::from(result);
            println!("{}", hex0x(&output.abi_encode()));
        }
    }
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<()> {
    let input = args.proof.load(None)?;
    let outcome = input.verify().context("invalid proof")?;
    let result = MPTVerificationResult::new(input.root.0, &input.key, outcome);
    info!(included = result.included, "proof verified");

    print_result(&result, args.format)?;

    if let Some(expected) = args.expect {
        if outcome.value() != Some(&expected[..]) {
            bail!("proven value does not match {}", hex0x(&expected));
        }
    }
    Ok(())
}

fn receipt(args: ReceiptArgs) -> Result<()> {
    let input = args.proof.load(args.tx_index.map(receipt_trie_key))?;
    let outcome = input.verify().context("invalid proof")?;
    let Some(value) = outcome.value() else {
        bail!("proof excludes the receipt: {outcome:?}");
    };

    let receipt = Receipt::decode(value).context("proven value is not a receipt")?;
    info!(
        status = %receipt.status,
        logs = receipt.logs.len(),
        "receipt verified"
    );

    let filter = match (args.emitter, &args.event) {
        (Some(emitter), Some(event)) => Some(LogFilter::for_event(emitter, event)),
        _ => None,
    };
    let logs: Vec<_> = match (&filter, args.emitter) {
        (Some(filter), _) => receipt.matching_logs(filter).collect(),
        (None, Some(emitter)) => receipt.logs.iter().filter(|log| log.address == emitter).collect(),
        (None, None) => receipt.logs.iter().collect(),
    };

    match args.format {
        ReceiptFormat::Json => {
            let logs: Vec<_> = logs
                .iter()
                .map(|log| {
                    json!({
                        "address": hex0x(log.address.as_slice()),
                        "topics": log.topics.iter().map(|t| hex0x(t.as_slice())).collect::<Vec<_>>(),
                        "data": hex0x(log.data),
                    })
                })
                .collect();
            let report = json!({
                "root": hex0x(input.root.as_slice()),
                "key": hex0x(&input.key),
                "tx_type": receipt.tx_type,
                "status": receipt.status.to_string(),
                "cumulative_gas_used": receipt.cumulative_gas_used.to_string(),
                "logs": logs,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReceiptFormat::Text => {
            println!("Status: {}", receipt.status);
            println!("Cumulative gas used: {}", receipt.cumulative_gas_used);
            for log in &logs {
                println!("Log from {}", hex0x(log.address.as_slice()));
                for topic in &log.topics {
                    println!("  topic {}", hex0x(topic.as_slice()));
                }
                println!("  data {}", hex0x(log.data));
            }
        }
    }

    if args.emitter.is_some() {
        if !receipt.is_success() {
            bail!("receipt reverted");
        }
        if logs.is_empty() {
            bail!("no matching event in receipt");
        }
    }
    Ok(())
}

fn setup_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    // Setup the logger.
    setup_logger();

    // Parse the command line arguments.
    let cli = Cli::parse();

    match cli.command {
        Command::Verify(args) => verify(args),
        Command::Receipt(args) => receipt(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";

    #[test]
    fn test_receipt_rejects_abi_format() {
        let parsed = Cli::try_parse_from(["mpt-verify", "receipt", "--root", ROOT, "--tx-index", "0", "--format", "abi"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_receipt_accepts_json_format() {
        let cli = Cli::try_parse_from(["mpt-verify", "receipt", "--root", ROOT, "--tx-index", "0", "--format", "json"])
            .unwrap();
        match cli.command {
            Command::Receipt(args) => {
                assert_eq!(args.format, ReceiptFormat::Json);
                assert_eq!(args.tx_index, Some(0));
            }
            Command::Verify(_) => panic!("expected receipt command"),
        }
    }

    #[test]
    fn test_verify_accepts_abi_format() {
        let cli = Cli::try_parse_from(["mpt-verify", "verify", "--root", ROOT, "--node", "0x80", "--format", "abi"])
            .unwrap();
        match cli.command {
            Command::Verify(args) => {
                assert_eq!(args.format, Format::Abi);
                assert_eq!(args.proof.nodes.len(), 1);
            }
            Command::Receipt(_) => panic!("expected verify command"),
        }
    }
}
