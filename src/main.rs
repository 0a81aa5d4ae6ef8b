use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use merkle_log::{Hash, MerkleTree, MerkleTreeError, Result, hash, verify};

#[derive(Parser)]
#[command(name = "merkle-log")]
#[command(about = "Build a merkle tree over line-delimited input and work with inclusion proofs")]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build the tree and print its root hash
  Root { file: PathBuf },
  /// Print the sibling hashes proving the leaf at INDEX, bottom-up
  Prove { file: PathBuf, index: u64 },
  /// Check the inclusion proof for the leaf at INDEX against ROOT
  Verify { file: PathBuf, index: u64, root: String },
}

fn main() -> ExitCode {
  let args = Args::parse();
  match run(args.command) {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(e) => {
      eprintln!("ERROR: {e}");
      ExitCode::FAILURE
    }
  }
}

fn run(command: Command) -> Result<bool> {
  match command {
    Command::Root { file } => {
      let (tree, _) = build(&file)?;
      println!("{}", tree.get_root()?.to_hex());
      Ok(true)
    }
    Command::Prove { file, index } => {
      let (tree, leaves) = build(&file)?;
      check_index(index, leaves.len() as u64)?;
      for sibling in tree.generate_merkle_proof(index, tree.leaf_count()) {
        println!("{}", sibling.to_hex());
      }
      Ok(true)
    }
    Command::Verify { file, index, root } => {
      let root = Hash::from_hex(&root).map_err(|e| MerkleTreeError::InvalidData(e.to_string()))?;
      let (tree, leaves) = build(&file)?;
      check_index(index, leaves.len() as u64)?;
      let proof = tree.generate_merkle_proof(index, tree.leaf_count());
      let leaf = hash(leaves[index as usize].as_bytes());
      let ok = verify(&proof, root, leaf, index);
      println!("{}", if ok { "ok" } else { "FAILED" });
      Ok(ok)
    }
  }
}

/// One leaf per line, in file order.
fn build(file: &Path) -> Result<(MerkleTree, Vec<String>)> {
  let leaves = read_to_string(file)?.lines().map(str::to_string).collect::<Vec<_>>();
  let mut tree = MerkleTree::new();
  tree.build_tree(&leaves);
  Ok((tree, leaves))
}

fn check_index(index: u64, leaf_count: u64) -> Result<()> {
  if index >= leaf_count {
    Err(MerkleTreeError::InvalidData(format!("leaf index {index} out of range for {leaf_count} leaves")))
  } else {
    Ok(())
  }
}
