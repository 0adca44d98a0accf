//! # Canonical Serialization — RLP Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for
//! bytes that are transmitted to the root chain or persisted, and the
//! [`Rlp`] item tree they are produced from. Framing is delegated to the
//! `rlp` crate: `RlpStream` writes prefixes, and its decoder reads them.
//!
//! ## Encoding Rules
//!
//! Recursive Length Prefix, as used by the root-chain contract:
//!
//! 1. A single byte below `0x80` is its own encoding.
//! 2. A byte string of 0–55 bytes is `0x80 + len` followed by the bytes.
//! 3. A longer byte string is `0xb7 + len(len)`, the big-endian length,
//!    then the bytes.
//! 4. A list whose concatenated item encodings total 0–55 bytes is
//!    `0xc0 + len` followed by the payload; longer lists use `0xf7 + len(len)`.
//! 5. Unsigned integers are their minimal big-endian bytes; zero is the
//!    empty string (`0x80`).
//!
//! ## Security Invariant
//!
//! The decoder is strict. It rejects every non-minimal form (a single low
//! byte wrapped in a length prefix, a long-form length for a short payload,
//! leading zeros in lengths or integers) and trailing bytes. Every accepted
//! input therefore re-encodes to itself, so two distinct byte strings can
//! never decode to the same transaction.
//!
//! Lists may nest at most [`MAX_DEPTH`] levels. Deeper input is rejected
//! before it can exhaust the stack.

use rlp::{DecoderError, Rlp as RlpView, RlpStream};

use crate::digest::Hash256;
use crate::error::CodecError;
use crate::hex;
use crate::identity::Address;

/// Deepest list nesting the decoder accepts. A transaction needs three.
pub const MAX_DEPTH: usize = 16;

/// One node of an RLP item tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rlp {
    /// A byte string.
    Bytes(Vec<u8>),
    /// An ordered list of items.
    List(Vec<Rlp>),
}

impl Rlp {
    /// A byte-string item.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// A list item.
    pub fn list(items: Vec<Rlp>) -> Self {
        Self::List(items)
    }

    /// An unsigned integer item (minimal big-endian, zero is empty).
    pub fn uint(value: u128) -> Self {
        Self::Bytes(minimal_be(value))
    }

    /// Encode this item into canonical bytes.
    pub fn encode(&self) -> CanonicalBytes {
        let mut stream = RlpStream::new();
        self.append_to(&mut stream);
        CanonicalBytes(stream.out().to_vec())
    }

    fn append_to(&self, stream: &mut RlpStream) {
        match self {
            Self::Bytes(bytes) => {
                stream.append(bytes);
            }
            Self::List(items) => {
                stream.begin_list(items.len());
                for item in items {
                    item.append_to(stream);
                }
            }
        }
    }

    /// Decode exactly one item from `input`.
    ///
    /// # Errors
    ///
    /// Fails if the input is truncated, non-canonical, nested deeper than
    /// [`MAX_DEPTH`], or has bytes left over after the top-level item.
    pub fn decode(input: &[u8]) -> Result<Self, CodecError> {
        let consumed = item_len(input)?;
        if consumed != input.len() {
            return Err(CodecError::TrailingBytes(input.len() - consumed));
        }
        decode_item(input, 0)
    }

    /// The byte string, or `ExpectedBytes` for a list.
    pub fn as_bytes(&self) -> Result<&[u8], CodecError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::List(_) => Err(CodecError::ExpectedBytes),
        }
    }

    /// The list items, or `ExpectedList` for a byte string.
    pub fn as_list(&self) -> Result<&[Rlp], CodecError> {
        match self {
            Self::List(items) => Ok(items),
            Self::Bytes(_) => Err(CodecError::ExpectedList),
        }
    }

    /// The list items, requiring exactly `arity` of them.
    pub fn as_list_of(&self, arity: usize) -> Result<&[Rlp], CodecError> {
        let items = self.as_list()?;
        if items.len() != arity {
            return Err(CodecError::WrongArity {
                expected: arity,
                found: items.len(),
            });
        }
        Ok(items)
    }

    /// Interpret a byte string as a minimal big-endian unsigned integer.
    pub fn as_u128(&self) -> Result<u128, CodecError> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 16 {
            return Err(CodecError::IntegerOverflow(128));
        }
        if bytes.first() == Some(&0) {
            return Err(CodecError::NonCanonical("integer has a leading zero byte"));
        }
        Ok(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
    }

    /// As [`as_u128`](Self::as_u128), narrowed to 64 bits.
    pub fn as_u64(&self) -> Result<u64, CodecError> {
        u64::try_from(self.as_u128()?).map_err(|_| CodecError::IntegerOverflow(64))
    }

    /// As [`as_u128`](Self::as_u128), narrowed to 8 bits.
    pub fn as_u8(&self) -> Result<u8, CodecError> {
        u8::try_from(self.as_u128()?).map_err(|_| CodecError::IntegerOverflow(8))
    }

    /// A byte string of exactly `N` bytes.
    pub fn as_fixed<const N: usize>(&self) -> Result<[u8; N], CodecError> {
        let bytes = self.as_bytes()?;
        if bytes.len() != N {
            return Err(CodecError::WrongLength {
                expected: N,
                found: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

/// Bytes produced exclusively by RLP encoding.
///
/// # Invariants
///
/// - The only constructors are [`Rlp::encode()`] and [`Encodable::to_canonical()`].
/// - The inner `Vec<u8>` is private, so downstream code cannot hand-splice
///   bytes into something that claims to be a canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Access the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the encoding.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the encoding is empty. Never true for a valid item.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }

    /// Consume into the raw byte vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A value with a canonical RLP form.
pub trait Encodable {
    /// Build the item tree for this value.
    fn to_rlp(&self) -> Rlp;

    /// Encode this value into canonical bytes.
    fn to_canonical(&self) -> CanonicalBytes {
        self.to_rlp().encode()
    }
}

/// A value that can be rebuilt from its canonical RLP form.
pub trait Decodable: Sized {
    /// Map a decoded item tree onto this type.
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError>;

    /// Decode from canonical bytes.
    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::from_rlp(&Rlp::decode(bytes)?)
    }
}

impl Encodable for u64 {
    fn to_rlp(&self) -> Rlp {
        Rlp::uint(u128::from(*self))
    }
}

impl Decodable for u64 {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        item.as_u64()
    }
}

impl Encodable for u128 {
    fn to_rlp(&self) -> Rlp {
        Rlp::uint(*self)
    }
}

impl Decodable for u128 {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        item.as_u128()
    }
}

impl Encodable for Hash256 {
    fn to_rlp(&self) -> Rlp {
        Rlp::bytes(self.0.to_vec())
    }
}

impl Decodable for Hash256 {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        Ok(Hash256(item.as_fixed::<32>()?))
    }
}

impl Encodable for Address {
    fn to_rlp(&self) -> Rlp {
        Rlp::bytes(self.0.to_vec())
    }
}

impl Decodable for Address {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        Ok(Address(item.as_fixed::<20>()?))
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn to_rlp(&self) -> Rlp {
        Rlp::List(self.iter().map(Encodable::to_rlp).collect())
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        item.as_list()?.iter().map(T::from_rlp).collect()
    }
}

/// Minimal big-endian bytes of `value`; zero yields the empty vector.
fn minimal_be(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn codec_error(err: DecoderError) -> CodecError {
    match err {
        DecoderError::RlpIsTooShort | DecoderError::RlpInconsistentLengthAndData => {
            CodecError::EndOfInput
        }
        DecoderError::RlpDataLenWithZeroPrefix | DecoderError::RlpListLenWithZeroPrefix => {
            CodecError::NonCanonical("length prefix has a leading zero byte")
        }
        DecoderError::RlpInvalidIndirection => {
            CodecError::NonCanonical("length prefix is longer than the payload needs")
        }
        DecoderError::RlpIsTooBig => CodecError::LengthOverflow,
        DecoderError::RlpExpectedToBeList => CodecError::ExpectedList,
        DecoderError::RlpExpectedToBeData => CodecError::ExpectedBytes,
        _ => CodecError::NonCanonical("malformed item header"),
    }
}

/// Total length (prefix plus payload) of the item at the front of `bytes`.
fn item_len(bytes: &[u8]) -> Result<usize, CodecError> {
    let info = RlpView::new(bytes).payload_info().map_err(codec_error)?;
    let total = info
        .header_len
        .checked_add(info.value_len)
        .ok_or(CodecError::LengthOverflow)?;
    if total > bytes.len() {
        return Err(CodecError::EndOfInput);
    }
    Ok(total)
}

/// Decode `bytes`, which hold exactly one item, found at list depth `depth`.
fn decode_item(bytes: &[u8], depth: usize) -> Result<Rlp, CodecError> {
    let view = RlpView::new(bytes);
    if !view.is_list() {
        return view
            .decoder()
            .decode_value(|value| Ok(value.to_vec()))
            .map(Rlp::Bytes)
            .map_err(codec_error);
    }
    if depth >= MAX_DEPTH {
        return Err(CodecError::TooDeep(MAX_DEPTH));
    }

    let info = view.payload_info().map_err(codec_error)?;
    let mut payload = bytes.get(info.header_len..).ok_or(CodecError::EndOfInput)?;
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = payload.split_at(item_len(payload)?);
        items.push(decode_item(item, depth + 1)?);
        payload = rest;
    }
    Ok(Rlp::List(items))
}
