//! Console walkthrough: commit a batch of transactions, prove one of them,
//! then mine a run of blocks while the difficulty controller adapts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ledger_core::{verify, CommitmentTree, MiningConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod session;
mod state;

use session::MiningSession;

#[derive(Debug, Parser)]
#[command(name = "ledger-demo", version, about = "Merkle commitments and proof-of-work walkthrough")]
struct Args {
    /// JSON mining configuration (difficulty, targetIntervalSeconds, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of blocks to mine after genesis
    #[arg(short, long, default_value_t = 12)]
    blocks: u64,

    /// Number of transactions committed in the Merkle walkthrough
    #[arg(short, long, default_value_t = 19)]
    records: usize,

    /// Transaction to prove (defaults to the last one)
    #[arg(short, long)]
    prove: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MiningConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MiningConfig::default(),
    };
    info!(?config, "starting ledger demo");

    merkle_walkthrough(args.records, args.prove.as_deref());

    let mut session = MiningSession::new(&config).context("mining genesis block")?;
    session.run(args.blocks).context("mining blocks")?;

    println!("\nChain length: {}", session.ledger().len());
    println!("Chain linked: {}", session.ledger().is_linked());
    println!("Hash rate: {}", session.stats().format_hash_rate());
    println!("{}", session.stats().to_json().context("serializing stats")?);
    Ok(())
}

fn merkle_walkthrough(count: usize, prove: Option<&str>) {
    let transactions: Vec<String> = (1..=count).map(|i| format!("transaction{}", i)).collect();
    let tree = CommitmentTree::build(&transactions);

    let Some(root) = tree.root() else {
        println!("Merkle Root: none (no transactions)");
        return;
    };
    println!("Merkle Root: {}", root);
    println!("\nMerkle Tree:\n{}", tree);

    let target = prove
        .map(str::to_string)
        .unwrap_or_else(|| format!("transaction{}", count));

    match tree.proof(&target) {
        Some(proof) => {
            println!("Transaction Hash: {}", proof.leaf_digest);
            println!("Merkle Path Length: {}", proof.path.len());
            for (i, sibling) in proof.path.iter().enumerate() {
                println!("  [{}] {}", i, sibling);
            }
            println!("Is Valid: {}", verify(root, &proof.leaf_digest, &proof.path));
        }
        None => println!("Transaction {:?} is not in the tree", target),
    }
}
