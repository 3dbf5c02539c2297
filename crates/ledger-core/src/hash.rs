//! SHA256 commitments and the hex digest type shared by trees and blocks.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::DigestError;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a digest rendered as hex.
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// Single SHA256 hash.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Commit to an arbitrary payload.
#[inline]
pub fn hash_commit(data: impl AsRef<[u8]>) -> Digest {
    Digest(sha256(data.as_ref()))
}

/// A 256-bit SHA256 output.
///
/// Externally a digest is always 64 lowercase hex characters. Internal tree
/// nodes and the proof verifier hash the concatenation of two such strings,
/// not of the raw bytes, so the hex form is part of the commitment format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the canonical lowercase hex form.
    ///
    /// Uppercase is rejected: two spellings of the same digest would let a
    /// tampered proof string verify.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        if s.len() != DIGEST_HEX_LEN {
            return Err(DigestError::Length(s.chars().count()));
        }
        if let Some((offset, ch)) = s
            .char_indices()
            .find(|(_, c)| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(DigestError::Character { ch, offset });
        }

        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| DigestError::Length(s.len()))?;
        Ok(Digest(bytes))
    }

    /// Hash the hex concatenation `self ++ right`.
    pub fn combine(&self, right: &Digest) -> Digest {
        hash_commit(concat_hex(self, right))
    }

    /// Number of leading `'0'` characters in the hex form.
    pub fn leading_zero_nibbles(&self) -> u32 {
        count_leading_zero_nibbles(&self.0)
    }

    /// True when the first `difficulty` hex characters are all `'0'`.
    ///
    /// A difficulty of 0 is always met; anything above 64 never is.
    #[inline]
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_nibbles() >= difficulty
    }
}

/// The preimage of an internal node: `left.hex ++ right.hex`.
pub fn concat_hex(left: &Digest, right: &Digest) -> String {
    let mut out = String::with_capacity(DIGEST_HEX_LEN * 2);
    out.push_str(&left.to_hex());
    out.push_str(&right.to_hex());
    out
}

/// Count leading zero hex characters of a big-endian byte string.
pub fn count_leading_zero_nibbles(bytes: &[u8]) -> u32 {
    let mut zeros = 0u32;
    for byte in bytes {
        if *byte == 0 {
            zeros += 2;
        } else {
            if *byte < 0x10 {
                zeros += 1;
            }
            break;
        }
    }
    zeros
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
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
