//! # plasma-ledger — Child-Chain Ledger Values
//!
//! The values that move through the child chain and the observer-side
//! projection built from them:
//!
//! - [`Transaction`] with its [`Input`]s and [`Output`]s. Every transaction
//!   has two content-addressed hashes: the *signing hash* (signatures
//!   excluded, the message each input owner signs) and the *identity id*
//!   (signatures included, the Merkle leaf and the reference later
//!   transactions spend).
//! - [`Header`], the block header committed to the root chain.
//! - [`UtxoIndex`], a wallet/indexer view of unspent outputs per address.
//!   It is not part of the trust boundary; the exit reconciler in
//!   `plasma-state` never consults it.
//!
//! ## Crate Policy
//!
//! - Transactions and headers are immutable after construction. Signing
//!   an input yields a new transaction.
//! - Wire bytes come only from the canonical RLP encoder in `plasma-core`.

pub mod header;
pub mod transaction;
pub mod utxo;

pub use header::Header;
pub use transaction::{validate_encoded, validate_signature, Input, Output, Transaction};
pub use utxo::{UtxoEntry, UtxoIndex};
