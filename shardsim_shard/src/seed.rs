//! Seed derivation for shuffle-shard placement.
use md5::{Digest, Md5};

/// Maps a tenant identifier (and an optional namespace) to a placement seed.
///
/// Must be deterministic. Placement only, never security. Plain closures
/// implement it, which is handy for tests that need predictable seeds.
pub trait SeedDeriver {
    /// Seed for `identifier` within `namespace` (empty for none).
    fn derive(&self, identifier: &str, namespace: &str) -> u64;
}

impl<F> SeedDeriver for F
where
    F: Fn(&str, &str) -> u64,
{
    fn derive(&self, identifier: &str, namespace: &str) -> u64 {
        self(identifier, namespace)
    }
}

/// MD5 of the identifier, with a NUL separator and the namespace appended
/// when one is given; the seed is the first 8 digest bytes, big-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5SeedDeriver;

impl SeedDeriver for Md5SeedDeriver {
    fn derive(&self, identifier: &str, namespace: &str) -> u64 {
        let mut hasher = Md5::new();
        hasher.update(identifier.as_bytes());
        if !namespace.is_empty() {
            hasher.update([0u8]);
            hasher.update(namespace.as_bytes());
        }
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}
