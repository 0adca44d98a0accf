//! # Account Addresses
//!
//! `Address` is the 20-byte account identifier of the root chain. Output
//! recipients, exit payees, and recovered signers are all addresses; the
//! newtype prevents a 20-byte address from being confused with the low 20
//! bytes of a `Hash256`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HexError;
use crate::hex;

/// A 20-byte root-chain account address.
///
/// Serializes as a `0x`-prefixed lowercase hex string. The zero address is
/// the recipient of null outputs and of exit transactions.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }

    /// Parse from hex text, left-padding short values with zero bytes.
    pub fn from_hex(text: &str) -> Result<Self, HexError> {
        Ok(Self(hex::decode_padded::<20>(text)?))
    }

    /// Left-pad a short byte string to 20 bytes.
    pub fn from_slice_padded(bytes: &[u8]) -> Result<Self, HexError> {
        Ok(Self(hex::pad_left::<20>(bytes)?))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
