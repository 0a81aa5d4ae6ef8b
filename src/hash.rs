use blake3::Hasher;

pub use blake3::Hash;

/// Hash a single opaque byte string into a leaf digest.
pub fn hash(data: &[u8]) -> Hash {
  blake3::hash(data)
}

/// Combine two child hashes into their parent, left-right order significant.
pub fn combine(left: &Hash, right: &Hash) -> Hash {
  let mut hasher = Hasher::new();
  hasher.update(left.as_bytes());
  hasher.update(right.as_bytes());
  hasher.finalize()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn combine_is_order_sensitive() {
    let a = hash(b"a");
    let b = hash(b"b");
    assert_ne!(combine(&a, &b), combine(&b, &a));
    assert_ne!(combine(&a, &b), a);
  }

  #[test]
  fn combine_equals_hash_of_concatenated_digests() {
    let a = hash(b"a");
    let b = hash(b"b");
    let mut concat = Vec::new();
    concat.extend_from_slice(a.as_bytes());
    concat.extend_from_slice(b.as_bytes());
    assert_eq!(combine(&a, &b), blake3::hash(&concat));
  }
}
