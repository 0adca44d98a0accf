//! # plasma-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the child chain:
//!
//! - **secp256k1** recoverable signatures over 32-byte digests, with
//!   Ethereum-style `(v, r, s)` values and address recovery, so a signer is
//!   identified by the same 20-byte address the root chain uses.
//! - **Merkle trees** over transaction ids with sorted-pair Keccak-256
//!   nodes, matching the common on-chain `MerkleProof` verifier.
//! - **Keccak-256** re-exported from `plasma-core`.
//!
//! ## Crate Policy
//!
//! - Depends only on `plasma-core` internally.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   secp256k1 keys and real Keccak-256.
//! - `unsafe` prohibited.

pub mod merkle;
pub mod signature;

pub use merkle::{hash_pair, verify_proof, MerkleProof, MerkleTree};
pub use plasma_core::{keccak256, typed_tuple_hash};
pub use signature::{address_of, recover_address, verify_address, Signature, SigningKeyPair};
