//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the child-chain ledger. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Codec errors name the exact canonicality rule that was violated.
//! - Ledger errors carry the output reference `(tx_id, output_index)` they
//!   concern, so a rejected withdrawal can be traced to a single UTXO.
//! - Predicates (`verify`, `verify_proof`) never produce errors; they
//!   return `false`.

use thiserror::Error;

use crate::digest::Hash256;

/// Top-level error type for the child-chain ledger.
#[derive(Error, Debug)]
pub enum PlasmaError {
    /// Transaction violates input/output cardinality rules.
    #[error("invalid transaction shape: {0}")]
    InvalidShape(String),

    /// A Merkle proof did not reconstruct the claimed root.
    #[error("merkle proof invalid: {0}")]
    ProofInvalid(String),

    /// The exit signature does not recover to the owner of the referenced output.
    #[error("signature does not recover to the owner of output {tx_id}:{output_index}")]
    NotOwner {
        /// Identity id of the transaction that created the output.
        tx_id: Hash256,
        /// Index of the output within that transaction.
        output_index: u64,
    },

    /// The output has already been paid out on the root chain.
    #[error("output {tx_id}:{output_index} already withdrawn")]
    AlreadyWithdrawn {
        /// Identity id of the transaction that created the output.
        tx_id: Hash256,
        /// Index of the output within that transaction.
        output_index: u64,
    },

    /// A proof was requested for a leaf that is not in the tree.
    #[error("leaf {0} not found in merkle tree")]
    LeafNotFound(Hash256),

    /// A proof was requested for a leaf position past the last leaf.
    #[error("leaf index {index} out of range for tree with {count} leaves")]
    LeafIndexOutOfRange {
        /// Requested leaf position.
        index: usize,
        /// Number of leaves in the tree.
        count: usize,
    },

    /// A Merkle tree was requested over zero leaves.
    #[error("merkle tree requires at least one leaf")]
    EmptyTree,

    /// No header is recorded at the requested number.
    #[error("unknown header number {0}")]
    UnknownHeader(u64),

    /// An output index points past the end of a transaction's outputs.
    #[error("output index {index} out of range for transaction with {count} outputs")]
    OutputIndexOutOfRange {
        /// Requested output index.
        index: u64,
        /// Number of outputs the transaction actually has.
        count: usize,
    },

    /// The root chain refused a header submission.
    #[error("header rejected: {0}")]
    HeaderRejected(String),

    /// Canonical decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Hex parsing failed.
    #[error("hex error: {0}")]
    Hex(#[from] HexError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A key or signature could not be used.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Signature bytes are malformed or do not recover a public key.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Producing a signature failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Error while decoding RLP bytes or mapping an item tree onto a typed value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the announced length.
    #[error("unexpected end of input")]
    EndOfInput,

    /// Bytes remain after the top-level item.
    #[error("{0} trailing bytes after top-level item")]
    TrailingBytes(usize),

    /// Input is decodable but not in minimal canonical form.
    #[error("non-canonical encoding: {0}")]
    NonCanonical(&'static str),

    /// A length prefix does not fit in `usize`.
    #[error("length prefix overflows usize")]
    LengthOverflow,

    /// Lists nest deeper than the decoder accepts.
    #[error("lists nested deeper than {0} levels")]
    TooDeep(usize),

    /// Expected a list, found a byte string.
    #[error("expected list, found byte string")]
    ExpectedList,

    /// Expected a byte string, found a list.
    #[error("expected byte string, found list")]
    ExpectedBytes,

    /// Integer does not fit in the target width.
    #[error("integer does not fit in {0} bits")]
    IntegerOverflow(u32),

    /// A list had the wrong number of elements.
    #[error("expected list of {expected} items, found {found}")]
    WrongArity {
        /// Required item count.
        expected: usize,
        /// Actual item count.
        found: usize,
    },

    /// A fixed-width field had the wrong byte length.
    #[error("expected {expected} bytes, found {found}")]
    WrongLength {
        /// Required byte length.
        expected: usize,
        /// Actual byte length.
        found: usize,
    },

    /// Bytes decoded structurally but describe a value the type forbids.
    #[error("decoded value is invalid: {0}")]
    Invalid(&'static str),
}

/// Error while parsing hex text or padding bytes to a fixed width.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Input contained a non-hex character.
    #[error("invalid hex character {found:?} at position {position}")]
    InvalidCharacter {
        /// The offending character.
        found: char,
        /// Position in the input after any `0x` prefix.
        position: usize,
    },

    /// Input is longer than the target width.
    #[error("value of {found} bytes does not fit in {max} bytes")]
    TooLong {
        /// Target width in bytes.
        max: usize,
        /// Actual length in bytes.
        found: usize,
    },
}

/// Error while loading a [`ChainConfig`](crate::config::ChainConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid YAML for the config schema.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config parsed but violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}
