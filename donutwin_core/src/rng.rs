use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::seed::SeedPair;

// Provably-fair digest stream
// "server_seed:client_seed:nonce" -> SHA-256 -> lowercase hex -> big-endian slices

pub const SEPARATOR: char = ':';

/// Hex characters a single `take_bits` call can return (64 bits).
pub const MAX_TAKE: usize = 16;

/// Extension digests a distribution may request before giving up.
pub const MAX_EXTENSION_ROUNDS: u32 = 1024;

pub fn derive_hash_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-256 output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexDigest(String);

impl HexDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `length` hex characters starting at `offset`, read as a big-endian
    /// unsigned integer. `None` once the slice runs past the digest.
    pub fn take_bits(&self, offset: usize, length: usize) -> Option<u64> {
        if length == 0 || length > MAX_TAKE {
            return None;
        }
        let end = offset.checked_add(length)?;
        let slice = self.0.get(offset..end)?;
        u64::from_str_radix(slice, 16).ok()
    }
}

pub fn digest(seeds: &SeedPair) -> HexDigest {
    let msg = format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        seeds.server_seed.as_str(),
        seeds.client_seed.as_str(),
        seeds.nonce
    );
    HexDigest(derive_hash_hex(msg.as_bytes()))
}

/// Digest for extension round `round` (1-based): the seed triple with the
/// round counter appended.
pub fn extended_digest(seeds: &SeedPair, round: u32) -> HexDigest {
    let msg = format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{round}",
        seeds.server_seed.as_str(),
        seeds.client_seed.as_str(),
        seeds.nonce
    );
    HexDigest(derive_hash_hex(msg.as_bytes()))
}

pub fn take_bits(digest: &HexDigest, offset: usize, length: usize) -> Option<u64> {
    digest.take_bits(offset, length)
}

/// Successive non-overlapping slices of a round's digest.
///
/// Running out is not handled here: the distribution decides whether to call
/// [`DigestStream::extend`], which moves on to the next extension digest.
pub struct DigestStream<'a> {
    seeds: &'a SeedPair,
    current: HexDigest,
    offset: usize,
    round: u32,
}

impl<'a> DigestStream<'a> {
    pub fn new(seeds: &'a SeedPair) -> Self {
        Self {
            seeds,
            current: digest(seeds),
            offset: 0,
            round: 0,
        }
    }

    pub fn current(&self) -> &HexDigest {
        &self.current
    }

    /// Extension rounds consumed so far.
    pub fn rounds(&self) -> u32 {
        self.round
    }

    pub fn next_bits(&mut self, length: usize) -> Option<u64> {
        let value = self.current.take_bits(self.offset, length)?;
        self.offset += length;
        Some(value)
    }

    pub fn extend(&mut self) -> Result<()> {
        if self.round >= MAX_EXTENSION_ROUNDS {
            return Err(EngineError::DerivationExhaustion { rounds: self.round });
        }
        self.round += 1;
        self.current = extended_digest(self.seeds, self.round);
        self.offset = 0;
        debug!(round = self.round, nonce = self.seeds.nonce, "digest extended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden() -> SeedPair {
        SeedPair::parse(&"00".repeat(32), "abc123", 1).unwrap()
    }

    #[test]
    fn test_determinism() {
        let seeds = golden();
        assert_eq!(digest(&seeds), digest(&seeds));
        assert_eq!(
            digest(&seeds).as_str(),
            "b0e6009669e6ce61c58bcc83cdef6529da6d28b7abdea1ea12547a8d24564aad"
        );
    }

    #[test]
    fn take_bits_reads_big_endian() {
        let d = digest(&golden());
        assert_eq!(d.take_bits(0, 2), Some(0xb0));
        assert_eq!(d.take_bits(0, 13), Some(0xb0e6009669e6c));
        assert_eq!(d.take_bits(62, 2), Some(0xad));
    }

    #[test]
    fn take_bits_out_of_range() {
        let d = digest(&golden());
        assert_eq!(d.take_bits(63, 2), None);
        assert_eq!(d.take_bits(0, 0), None);
        assert_eq!(d.take_bits(0, MAX_TAKE + 1), None);
        assert_eq!(d.take_bits(usize::MAX, 2), None);
    }

    #[test]
    fn stream_advances_and_extends() {
        let seeds = golden();
        let mut stream = DigestStream::new(&seeds);
        assert_eq!(stream.next_bits(2), Some(0xb0));
        assert_eq!(stream.next_bits(2), Some(0xe6));
        while stream.next_bits(2).is_some() {}
        stream.extend().unwrap();
        assert_eq!(stream.rounds(), 1);
        assert_eq!(stream.current(), &extended_digest(&seeds, 1));
        assert_ne!(extended_digest(&seeds, 1), digest(&seeds));
    }

    #[test]
    fn stream_extension_is_bounded() {
        let seeds = golden();
        let mut stream = DigestStream::new(&seeds);
        for _ in 0..MAX_EXTENSION_ROUNDS {
            stream.extend().unwrap();
        }
        assert_eq!(
            stream.extend(),
            Err(EngineError::DerivationExhaustion {
                rounds: MAX_EXTENSION_ROUNDS
            })
        );
    }
}
