use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use blake3::OUT_LEN;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::hash::{Hash, combine, hash};

pub type Result<T> = std::result::Result<T, MerkleTreeError>;

#[derive(Debug, Error)]
pub enum MerkleTreeError {
  /// Root requested from a tree that holds no leaves.
  #[error("the tree is empty; no root is present")]
  NotPresent,
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("invalid data: {0}")]
  InvalidData(String),
}

/// Binary Merkle tree backed by a flat, level-ordered hash log.
///
/// The log holds every hash the builder computes: level 0 is the leaf hashes
/// in input order (plus a duplicate of the last one when the leaf count is
/// odd), followed by each higher level in turn, ending with the root. Sibling
/// lookup is index arithmetic over this array instead of tree traversal.
pub struct MerkleTree {
  log: Vec<Hash>,
  leaf_count: u64,
}

impl MerkleTree {
  pub fn new() -> Self {
    MerkleTree { log: Vec::new(), leaf_count: 0 }
  }

  /// Hash the leaves and fold them level by level until a single root
  /// remains, recording every computed hash. Any level of odd length above 1
  /// gets its last node duplicated so that it pairs up. The previous log is
  /// replaced wholesale; the tree is never left half-built.
  pub fn build_tree<L: AsRef<[u8]>>(&mut self, leaves: &[L]) -> &[Hash] {
    let n = leaves.len() as u64;
    let sizes = level_sizes(n);
    let mut log = Vec::with_capacity(sizes.iter().sum::<u64>() as usize);

    for leaf in leaves {
      log.push(hash(leaf.as_ref()));
    }
    if !sizes.is_empty() && sizes[0] > n {
      log.push(log[log.len() - 1]);
    }

    let mut offset = 0;
    for level in 1..sizes.len() {
      let len = sizes[level - 1] as usize;
      for i in (0..len).step_by(2) {
        log.push(combine(&log[offset + i], &log[offset + i + 1]));
      }
      if sizes[level] as usize > len / 2 {
        log.push(log[log.len() - 1]);
      }
      offset += len;
    }

    debug_assert_eq!(log.len() as u64, log_len(n));
    self.leaf_count = n;
    self.log = log;
    &self.log
  }

  /// The root is always the last log entry.
  pub fn get_root(&self) -> Result<Hash> {
    self.log.last().copied().ok_or(MerkleTreeError::NotPresent)
  }

  /// Collect the sibling of `index` at every level, bottom-up. Walks the same
  /// level-size sequence the builder used, tracking the offset of the current
  /// level within the log. A tree of zero or one leaves has an empty proof,
  /// as does any `index` out of range or a `leaf_count` that differs from the
  /// count the log was built from.
  pub fn generate_merkle_proof(&self, index: u64, leaf_count: u64) -> Vec<Hash> {
    if leaf_count != self.leaf_count || index >= leaf_count {
      return Vec::new();
    }
    let sizes = level_sizes(leaf_count);
    let mut proof = Vec::with_capacity(proof_len(leaf_count));
    let mut index = index;
    let mut offset = 0;
    for &len in &sizes {
      if len <= 1 {
        break;
      }
      let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
      proof.push(self.log[(offset + sibling) as usize]);
      offset += len;
      index /= 2;
    }
    proof
  }

  /// Every hash the builder computed, level by level.
  pub fn log(&self) -> &[Hash] {
    &self.log
  }

  pub fn leaf_count(&self) -> u64 {
    self.leaf_count
  }

  /// Write the log to a file: leaf count and log length as u64 LE, then the
  /// raw 32-byte hashes in log order.
  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    w.write_u64::<LittleEndian>(self.leaf_count)?;
    w.write_u64::<LittleEndian>(self.log.len() as u64)?;
    for entry in &self.log {
      w.write_all(entry.as_bytes())?;
    }
    w.flush()?;
    Ok(())
  }

  /// Read a log written by [`save`](Self::save). The stored length must match
  /// the one the level-size recurrence dictates for the stored leaf count.
  pub fn load<P: AsRef<Path>>(path: P) -> Result<MerkleTree> {
    let file = File::open(path)?;
    let mut r = BufReader::new(file);
    let leaf_count = r.read_u64::<LittleEndian>()?;
    let len = r.read_u64::<LittleEndian>()?;
    if len != log_len(leaf_count) {
      return Err(MerkleTreeError::InvalidData(format!(
        "log length {len} does not match {leaf_count} leaves"
      )));
    }
    let mut log = Vec::with_capacity(len as usize);
    for _ in 0..len {
      let mut bytes = [0u8; OUT_LEN];
      r.read_exact(&mut bytes)?;
      log.push(Hash::from(bytes));
    }
    Ok(MerkleTree { log, leaf_count })
  }
}

impl Default for MerkleTree {
  fn default() -> Self {
    Self::new()
  }
}

/// Recompute the root from `leaf` and its sibling path. An even index places
/// the running hash on the left, an odd one on the right. A proof that does
/// not lead back to `root` yields `false`, never an error.
pub fn verify(proof: &[Hash], root: Hash, leaf: Hash, index: u64) -> bool {
  let mut current = leaf;
  let mut index = index;
  for sibling in proof {
    current = if index % 2 == 0 { combine(&current, sibling) } else { combine(sibling, &current) };
    index /= 2;
  }
  current == root
}

/// Node count of every level, bottom-up, for a tree over `leaf_count` leaves.
/// The builder, the proof generator and the size estimators all derive their
/// index bookkeeping from this one sequence so they cannot drift apart.
fn level_sizes(leaf_count: u64) -> Vec<u64> {
  let mut sizes = Vec::new();
  if leaf_count == 0 {
    return sizes;
  }
  let mut len = leaf_count;
  if len > 1 && len % 2 == 1 {
    len += 1;
  }
  sizes.push(len);
  while len > 1 {
    len /= 2;
    if len > 1 && len % 2 == 1 {
      len += 1;
    }
    sizes.push(len);
  }
  sizes
}

/// Total number of hashes a tree over `leaf_count` leaves records.
pub fn log_len(leaf_count: u64) -> u64 {
  level_sizes(leaf_count).iter().sum()
}

/// Number of siblings in a proof for a tree over `leaf_count` leaves.
pub fn proof_len(leaf_count: u64) -> usize {
  level_sizes(leaf_count).len().saturating_sub(1)
}
