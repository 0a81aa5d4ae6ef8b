pub mod hash;
pub mod merkle;

pub use hash::{Hash, combine, hash};
pub use merkle::{MerkleTree, MerkleTreeError, Result, log_len, proof_len, verify};
