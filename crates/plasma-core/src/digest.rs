//! # Digest Primitives — Keccak-256 and Typed-Tuple Hashing
//!
//! Defines `Hash256`, the 32-byte digest newtype used for transaction ids,
//! header hashes, and Merkle nodes, together with the two hashing paths of
//! the ledger:
//!
//! - [`keccak256()`] — raw Keccak-256 over arbitrary bytes.
//! - [`typed_tuple_hash()`] — Keccak-256 over a sequence of [`Token`]s, each
//!   packed to its Solidity `abi.encodePacked` width first.
//!
//! ## Security Invariant
//!
//! The packing rules must match the root-chain verifier byte for byte. A
//! transaction id computed here is compared against one recomputed by the
//! settlement contract during withdrawal; any divergence in packing makes
//! every withdrawal fail (or, worse, lets two different transactions share
//! an id).
//!
//! | Token     | Packed width | Encoding                     |
//! |-----------|--------------|------------------------------|
//! | `uint`    | 32 bytes     | big-endian, zero left-padded |
//! | `uint8`   | 1 byte       | raw                          |
//! | `address` | 20 bytes     | raw                          |
//! | `bytes32` | 32 bytes     | raw                          |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::HexError;
use crate::hex;
use crate::identity::Address;

/// A 32-byte Keccak-256 digest.
///
/// Serializes as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The all-zero digest, used as the parent hash of the genesis header
    /// and as the source id of placeholder inputs.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Create a digest from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }

    /// Parse from hex text, left-padding short values with zero bytes.
    ///
    /// `"0x0"` and `"0x1"` are accepted and yield the zero digest and the
    /// digest whose last byte is `0x01`.
    pub fn from_hex(text: &str) -> Result<Self, HexError> {
        Ok(Self(hex::decode_padded::<32>(text)?))
    }

    /// Left-pad a short byte string to 32 bytes.
    pub fn from_slice_padded(bytes: &[u8]) -> Result<Self, HexError> {
        Ok(Self(hex::pad_left::<32>(bytes)?))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Compute Keccak-256 of raw bytes.
pub fn keccak256(data: &[u8]) -> Hash256 {
    let hash = Keccak256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    Hash256(bytes)
}

/// One `(type, value)` element of a typed-tuple hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Solidity `uint` / `uint256`. Values above `u128::MAX` never occur in
    /// the ledger, so the upper 16 packed bytes are always zero.
    Uint(u128),
    /// Solidity `uint8`.
    Uint8(u8),
    /// Solidity `address`.
    Address(Address),
    /// Solidity `bytes32`.
    Bytes32(Hash256),
}

impl Token {
    /// Solidity type name of this token.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint256",
            Self::Uint8(_) => "uint8",
            Self::Address(_) => "address",
            Self::Bytes32(_) => "bytes32",
        }
    }

    /// Packed width in bytes.
    pub fn packed_len(&self) -> usize {
        match self {
            Self::Uint(_) | Self::Bytes32(_) => 32,
            Self::Uint8(_) => 1,
            Self::Address(_) => 20,
        }
    }

    fn pack_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Uint(v) => {
                out.extend_from_slice(&[0u8; 16]);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Self::Uint8(v) => out.push(*v),
            Self::Address(a) => out.extend_from_slice(a.as_bytes()),
            Self::Bytes32(h) => out.extend_from_slice(h.as_bytes()),
        }
    }
}

/// Concatenate the packed encodings of `tokens` in order.
pub fn encode_packed(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.iter().map(Token::packed_len).sum());
    for token in tokens {
        token.pack_into(&mut out);
    }
    out
}

/// Keccak-256 over the packed encoding of `tokens`.
///
/// Equivalent to Solidity `keccak256(abi.encodePacked(...))` and web3's
/// `soliditySha3` for the token types above.
pub fn typed_tuple_hash(tokens: &[Token]) -> Hash256 {
    keccak256(&encode_packed(tokens))
}
