use crate::error::{InspectError, Result};
use serde::{Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 fingerprint of a buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; Digest::LEN]);

impl Digest {
    /// Digest size in bytes.
    pub const LEN: usize = 32;

    pub fn of(buffer: &[u8]) -> Self {
        let mut out = [0u8; Digest::LEN];
        out.copy_from_slice(&Sha256::digest(buffer));
        Digest(out)
    }

    pub fn as_bytes(&self) -> &[u8; Digest::LEN] {
        &self.0
    }

    /// 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// True if `buffer` hashes to this digest.
    pub fn matches(&self, buffer: &[u8]) -> bool {
        Digest::of(buffer) == *self
    }
}

/// Computes the SHA-256 digest of `buffer`.
pub fn digest(buffer: &[u8]) -> Digest {
    Digest::of(buffer)
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut out = [0u8; Digest::LEN];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| InspectError::InvalidDigest(format!("{s:?}: {e}")))?;
        Ok(Digest(out))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_input_vector() {
        assert_eq!(digest(&[]).to_hex(), EMPTY);
    }

    #[test]
    fn abc_vector() {
        assert_eq!(
            digest(b"abc").to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn spans_multiple_blocks() {
        let input = b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq";
        assert_eq!(
            digest(input).to_hex(),
            "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
        );
    }

    #[test]
    fn single_bit_flip_changes_about_half_the_bits() {
        let a = digest(b"libnative.so");
        let b = digest(b"libnative.sn");
        let flipped: u32 = a
            .as_bytes()
            .iter()
            .zip(b.as_bytes())
            .map(|(x, y)| (x ^ y).count_ones())
            .sum();
        assert!((64..=192).contains(&flipped), "{flipped} bits differ");
    }

    #[test]
    fn parses_back_from_hex() {
        let d: Digest = EMPTY.to_uppercase().parse().unwrap();
        assert!(d.matches(&[]));
        assert_eq!(d.to_string(), EMPTY);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(matches!(
            "abcd".parse::<Digest>(),
            Err(InspectError::InvalidDigest(_))
        ));
        assert!(matches!(
            "zz".repeat(32).parse::<Digest>(),
            Err(InspectError::InvalidDigest(_))
        ));
    }
}
