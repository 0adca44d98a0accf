//! # Block Header
//!
//! A header commits one child-chain block to the root chain: the Merkle
//! root of the block's transaction ids, linked to the previous header by
//! hash. The header hash is the typed-tuple hash
//! `(uint version, bytes32 parentHash, bytes32 merkleRoot, uint createdAt)`;
//! the wire form is `[version, parentHash, merkleRoot, createdAt]`.
//!
//! Chain linkage (dense numbering, parent hashes) is enforced by whoever
//! stores headers, not by this type.

use plasma_core::{
    hex, typed_tuple_hash, CodecError, Decodable, Encodable, Hash256, PlasmaError, Rlp, Token,
    UnixTime,
};
use serde::{Deserialize, Serialize};

/// An immutable block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    version: u64,
    parent_hash: Hash256,
    merkle_root: Hash256,
    created_at: UnixTime,
}

impl Header {
    /// A header stamped with the current wall-clock time.
    pub fn new(version: u64, parent_hash: Hash256, merkle_root: Hash256) -> Self {
        Self::with_timestamp(version, parent_hash, merkle_root, UnixTime::now())
    }

    /// A header with an explicit creation time.
    pub fn with_timestamp(
        version: u64,
        parent_hash: Hash256,
        merkle_root: Hash256,
        created_at: UnixTime,
    ) -> Self {
        Self {
            version,
            parent_hash,
            merkle_root,
            created_at,
        }
    }

    /// Header format version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Hash of the previous header; zero for the first.
    pub fn parent_hash(&self) -> &Hash256 {
        &self.parent_hash
    }

    /// Root of the block's transaction-id tree.
    pub fn merkle_root(&self) -> &Hash256 {
        &self.merkle_root
    }

    /// When the operator built the header.
    pub fn created_at(&self) -> UnixTime {
        self.created_at
    }

    /// The header hash, as the root chain computes it.
    pub fn hash(&self) -> Hash256 {
        typed_tuple_hash(&[
            Token::Uint(u128::from(self.version)),
            Token::Bytes32(self.parent_hash),
            Token::Bytes32(self.merkle_root),
            Token::Uint(u128::from(self.created_at.as_secs())),
        ])
    }

    /// Header hash as `0x`-prefixed hex.
    pub fn hash_hex(&self) -> String {
        self.hash().to_hex()
    }

    /// Canonical wire bytes as `0x`-prefixed hex.
    pub fn encode_hex(&self) -> String {
        self.to_canonical().to_hex()
    }

    /// Decode from `0x`-prefixed hex wire bytes.
    pub fn decode_hex(text: &str) -> Result<Self, PlasmaError> {
        let bytes = hex::decode(text)?;
        Ok(Self::decode(&bytes)?)
    }
}

impl Encodable for Header {
    fn to_rlp(&self) -> Rlp {
        Rlp::list(vec![
            self.version.to_rlp(),
            self.parent_hash.to_rlp(),
            self.merkle_root.to_rlp(),
            self.created_at.as_secs().to_rlp(),
        ])
    }
}

impl Decodable for Header {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        let fields = item.as_list_of(4)?;
        Ok(Self {
            version: fields[0].as_u64()?,
            parent_hash: Hash256::from_rlp(&fields[1])?,
            merkle_root: Hash256::from_rlp(&fields[2])?,
            created_at: UnixTime::from_secs(fields[3].as_u64()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(n: &str) -> Hash256 {
        Hash256::from_hex(n).unwrap()
    }

    #[test]
    fn test_new_uses_wall_clock() {
        let before = UnixTime::now();
        let header = Header::new(0, Hash256::ZERO, root("0x1"));
        assert!(header.created_at() >= before);
    }

    #[test]
    fn test_hash_layout() {
        let created_at = UnixTime::from_secs(1_700_000_000);
        let header = Header::with_timestamp(2, root("0xaa"), root("0x1"), created_at);
        let expected = typed_tuple_hash(&[
            Token::Uint(2),
            Token::Bytes32(root("0xaa")),
            Token::Bytes32(root("0x1")),
            Token::Uint(1_700_000_000),
        ]);
        assert_eq!(header.hash(), expected);
        assert_eq!(header.hash_hex(), expected.to_hex());
    }

    #[test]
    fn test_hash_depends_on_every_field() {
        let base = Header::with_timestamp(0, Hash256::ZERO, root("0x1"), UnixTime::from_secs(5));
        let variants = [
            Header::with_timestamp(1, Hash256::ZERO, root("0x1"), UnixTime::from_secs(5)),
            Header::with_timestamp(0, root("0x9"), root("0x1"), UnixTime::from_secs(5)),
            Header::with_timestamp(0, Hash256::ZERO, root("0x2"), UnixTime::from_secs(5)),
            Header::with_timestamp(0, Hash256::ZERO, root("0x1"), UnixTime::from_secs(6)),
        ];
        for v in variants {
            assert_ne!(v.hash(), base.hash());
        }
    }

    #[test]
    fn test_wire_form() {
        let header = Header::with_timestamp(0, Hash256::ZERO, root("0x1"), UnixTime::from_secs(0));
        let bytes = header.to_canonical();
        assert_eq!(&bytes.as_bytes()[..2], &[0xf8, 68]);
        assert_eq!(bytes.len(), 70);
        assert_eq!(Header::decode(bytes.as_bytes()).unwrap(), header);
    }

    #[test]
    fn test_hex_roundtrip() {
        let header = Header::new(3, root("0xdead"), root("0xbeef"));
        assert_eq!(Header::decode_hex(&header.encode_hex()).unwrap(), header);
    }

    #[test]
    fn test_decode_rejects_short_root() {
        let bytes = Rlp::list(vec![
            Rlp::uint(0),
            Hash256::ZERO.to_rlp(),
            Rlp::bytes(vec![0x01]),
            Rlp::uint(0),
        ])
        .encode();
        assert!(matches!(
            Header::decode(bytes.as_bytes()),
            Err(CodecError::WrongLength { expected: 32, found: 1 })
        ));
    }

    #[test]
    fn test_serde_json() {
        let header = Header::with_timestamp(0, Hash256::ZERO, root("0x1"), UnixTime::from_secs(9));
        let json = serde_json::to_value(header).unwrap();
        assert_eq!(json["created_at"], 9);
        assert_eq!(json["merkle_root"], root("0x1").to_hex());
        let back: Header = serde_json::from_value(json).unwrap();
        assert_eq!(back, header);
    }
}
