//! # plasma-core — Foundational Types for the Plasma Child Chain
//!
//! This crate is the bedrock of the child-chain ledger. It defines the
//! byte-level primitives every other crate hashes, signs, and transmits.
//! Every other crate in the workspace depends on `plasma-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for chain primitives.** `Hash256` and `Address` are
//!    fixed-width newtypes with hex parsing that left-pads short input. No
//!    bare `[u8; N]` or hex strings cross crate boundaries.
//!
//! 2. **`CanonicalBytes` newtype.** Wire bytes are produced only by RLP
//!    encoding an [`Rlp`] item tree. The decoder is strict: any
//!    non-minimal length or integer encoding is rejected, so decoding and
//!    re-encoding is the identity on accepted input.
//!
//! 3. **Two hash paths, one packer.** `keccak256()` hashes raw bytes;
//!    `typed_tuple_hash()` packs `(type, value)` tokens to Solidity
//!    `abi.encodePacked` widths first. Transaction and header identities
//!    always go through the typed-tuple path so they agree with the
//!    root-chain verifier.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `plasma-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod config;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::{CanonicalBytes, Decodable, Encodable, Rlp, MAX_DEPTH};
pub use config::ChainConfig;
pub use digest::{encode_packed, keccak256, typed_tuple_hash, Hash256, Token};
pub use error::{CodecError, ConfigError, CryptoError, HexError, PlasmaError};
pub use identity::Address;
pub use temporal::UnixTime;
