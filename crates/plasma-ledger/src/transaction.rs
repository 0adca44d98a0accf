//! # Transaction Model
//!
//! A child-chain transaction consumes prior outputs (inputs) and creates
//! new ones (outputs). Inputs reference an output by the identity id of the
//! transaction that created it and the output's index.
//!
//! ## Hashes
//!
//! Both hashes are typed-tuple hashes (Solidity `abi.encodePacked` then
//! Keccak-256), so the root-chain verifier computes the same values:
//!
//! - **signing hash**: per input `(bytes32 sourceTxId, uint sourceOutputIndex)`,
//!   per output `(address recipient, uint amount)`, then `uint payload`.
//! - **identity id**: as above, with each input extended to
//!   `(bytes32 sourceTxId, uint sourceOutputIndex, uint8 v, bytes32 r, bytes32 s)`.
//!
//! ## Wire Form
//!
//! `[[ [txId, index, v, r, s] ... ], [ [recipient, amount] ... ], payload]`
//!
//! ## Security Invariant
//!
//! A signature commits to the signing hash, which cannot include the
//! signature itself. The identity id does include it, so the leaf committed
//! in a block pins the exact authorization that was accepted.

use plasma_core::{
    hex, typed_tuple_hash, Address, CodecError, Decodable, Encodable, Hash256, PlasmaError, Rlp,
    Token,
};
use plasma_crypto::{verify_address, Signature, SigningKeyPair};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A reference to a prior output, with the owner's authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    source_tx_id: Hash256,
    source_output_index: u64,
    signature: Signature,
}

impl Input {
    /// An unsigned input spending output `source_output_index` of `source_tx_id`.
    pub fn new(source_tx_id: Hash256, source_output_index: u64) -> Self {
        Self {
            source_tx_id,
            source_output_index,
            signature: Signature::none(),
        }
    }

    /// The placeholder input: zero transaction id, index 0, no signature.
    pub fn none() -> Self {
        Self::new(Hash256::ZERO, 0)
    }

    /// This input with `signature` attached.
    pub fn with_signature(self, signature: Signature) -> Self {
        Self { signature, ..self }
    }

    /// Identity id of the transaction that created the spent output.
    pub fn source_tx_id(&self) -> &Hash256 {
        &self.source_tx_id
    }

    /// Index of the spent output within its transaction.
    pub fn source_output_index(&self) -> u64 {
        self.source_output_index
    }

    /// The owner's signature, or [`Signature::none`].
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// True if this input is the placeholder.
    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }

    /// True if this input spends output `index` of `tx_id`.
    pub fn spends(&self, tx_id: &Hash256, index: u64) -> bool {
        self.source_tx_id == *tx_id && self.source_output_index == index
    }

    fn signing_tokens(&self, out: &mut Vec<Token>) {
        out.push(Token::Bytes32(self.source_tx_id));
        out.push(Token::Uint(u128::from(self.source_output_index)));
    }

    fn identity_tokens(&self, out: &mut Vec<Token>) {
        self.signing_tokens(out);
        out.push(Token::Uint8(self.signature.v()));
        out.push(Token::Bytes32(Hash256::from_bytes(*self.signature.r())));
        out.push(Token::Bytes32(Hash256::from_bytes(*self.signature.s())));
    }
}

impl Encodable for Input {
    fn to_rlp(&self) -> Rlp {
        Rlp::list(vec![
            self.source_tx_id.to_rlp(),
            self.source_output_index.to_rlp(),
            Rlp::uint(u128::from(self.signature.v())),
            Rlp::bytes(self.signature.r().to_vec()),
            Rlp::bytes(self.signature.s().to_vec()),
        ])
    }
}

impl Decodable for Input {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        let fields = item.as_list_of(5)?;
        let signature = Signature::new(
            fields[2].as_u8()?,
            fields[3].as_fixed::<32>()?,
            fields[4].as_fixed::<32>()?,
        );
        Ok(Self {
            source_tx_id: Hash256::from_rlp(&fields[0])?,
            source_output_index: fields[1].as_u64()?,
            signature,
        })
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// An amount assigned to a recipient address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    recipient: Address,
    amount: u128,
}

impl Output {
    /// Pay `amount` to `recipient`.
    pub fn new(recipient: Address, amount: u128) -> Self {
        Self { recipient, amount }
    }

    /// The null output: zero address, zero amount. Used for unused slots
    /// and as the destination of exit transactions.
    pub fn none() -> Self {
        Self::new(Address::ZERO, 0)
    }

    /// The receiving address.
    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// The amount.
    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// True for the null output.
    pub fn is_none(&self) -> bool {
        self.recipient.is_zero() && self.amount == 0
    }

    fn tokens(&self, out: &mut Vec<Token>) {
        out.push(Token::Address(self.recipient));
        out.push(Token::Uint(self.amount));
    }
}

impl Encodable for Output {
    fn to_rlp(&self) -> Rlp {
        Rlp::list(vec![self.recipient.to_rlp(), self.amount.to_rlp()])
    }
}

impl Decodable for Output {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        let fields = item.as_list_of(2)?;
        Ok(Self {
            recipient: Address::from_rlp(&fields[0])?,
            amount: fields[1].as_u128()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An immutable child-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    payload: u64,
}

/// Unchecked serde shape, validated through `Transaction::new`.
#[derive(Deserialize)]
struct RawTransaction {
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    #[serde(default)]
    payload: u64,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = PlasmaError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        Self::new(raw.inputs, raw.outputs, raw.payload)
    }
}

impl Transaction {
    /// Build a transaction.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::InvalidShape` if there are no inputs and no outputs.
    pub fn new(
        inputs: Vec<Input>,
        outputs: Vec<Output>,
        payload: u64,
    ) -> Result<Self, PlasmaError> {
        if inputs.is_empty() && outputs.is_empty() {
            return Err(PlasmaError::InvalidShape(
                "transaction must have at least one input or output".into(),
            ));
        }
        Ok(Self {
            inputs,
            outputs,
            payload,
        })
    }

    /// Build the deposit transaction crediting `amount` to `recipient`.
    ///
    /// The root chain sets `payload` to the number of the header that
    /// records the deposit, which keeps repeated identical deposits distinct.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::InvalidShape` if `amount` is zero.
    pub fn deposit(recipient: Address, amount: u128, payload: u64) -> Result<Self, PlasmaError> {
        if amount == 0 {
            return Err(PlasmaError::InvalidShape(
                "deposit amount must be positive".into(),
            ));
        }
        Self::new(Vec::new(), vec![Output::new(recipient, amount)], payload)
    }

    /// The inputs, in order.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// The outputs, in order.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// The payload word.
    pub fn payload(&self) -> u64 {
        self.payload
    }

    /// Output at `index`.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::OutputIndexOutOfRange` past the last output.
    pub fn output(&self, index: u64) -> Result<&Output, PlasmaError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.outputs.get(i))
            .ok_or(PlasmaError::OutputIndexOutOfRange {
                index,
                count: self.outputs.len(),
            })
    }

    /// True iff this is a deposit: no inputs and exactly one output with a
    /// positive amount.
    pub fn is_deposit(&self) -> bool {
        self.inputs.is_empty() && matches!(self.outputs.as_slice(), [only] if only.amount > 0)
    }

    /// The message every input owner signs. Signatures are excluded.
    pub fn signing_hash(&self) -> Hash256 {
        let mut tokens = Vec::with_capacity(self.inputs.len() * 2 + self.outputs.len() * 2 + 1);
        for input in &self.inputs {
            input.signing_tokens(&mut tokens);
        }
        self.tail_tokens(&mut tokens);
        typed_tuple_hash(&tokens)
    }

    /// The identity id: the Merkle leaf and the id later inputs reference.
    pub fn id(&self) -> Hash256 {
        let mut tokens = Vec::with_capacity(self.inputs.len() * 5 + self.outputs.len() * 2 + 1);
        for input in &self.inputs {
            input.identity_tokens(&mut tokens);
        }
        self.tail_tokens(&mut tokens);
        typed_tuple_hash(&tokens)
    }

    fn tail_tokens(&self, tokens: &mut Vec<Token>) {
        for output in &self.outputs {
            output.tokens(tokens);
        }
        tokens.push(Token::Uint(u128::from(self.payload)));
    }

    /// True iff `signature` over the signing hash recovers to `address`.
    /// Malformed or absent signatures yield `false`.
    pub fn verify(&self, signature: &Signature, address: &Address) -> bool {
        verify_address(&self.signing_hash(), signature, address)
    }

    /// A copy of this transaction with input `index` signed by `key`.
    ///
    /// Signing one input never changes the signing hash, so inputs may be
    /// signed in any order by different owners.
    pub fn sign_input(&self, index: usize, key: &SigningKeyPair) -> Result<Self, PlasmaError> {
        let count = self.inputs.len();
        let input = self.inputs.get(index).ok_or_else(|| {
            PlasmaError::InvalidShape(format!(
                "no input {index} in transaction with {count} inputs"
            ))
        })?;
        let signature = key.sign_digest(&self.signing_hash())?;
        let mut inputs = self.inputs.clone();
        inputs[index] = input.with_signature(signature);
        Ok(Self {
            inputs,
            ..self.clone()
        })
    }

    /// A copy of this transaction with every input signed by `key`.
    pub fn sign_all(&self, key: &SigningKeyPair) -> Result<Self, PlasmaError> {
        let signature = key.sign_digest(&self.signing_hash())?;
        self.with_signatures(&vec![signature; self.inputs.len()])
    }

    /// A copy of this transaction with one signature per input, in order.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::InvalidShape` if the counts differ.
    pub fn with_signatures(&self, signatures: &[Signature]) -> Result<Self, PlasmaError> {
        if signatures.len() != self.inputs.len() {
            return Err(PlasmaError::InvalidShape(format!(
                "{} signatures for {} inputs",
                signatures.len(),
                self.inputs.len()
            )));
        }
        let inputs = self
            .inputs
            .iter()
            .zip(signatures)
            .map(|(input, sig)| input.with_signature(*sig))
            .collect();
        Ok(Self {
            inputs,
            ..self.clone()
        })
    }

    /// Canonical wire bytes as `0x`-prefixed hex.
    pub fn encode_hex(&self) -> String {
        self.to_canonical().to_hex()
    }

    /// Identity id as `0x`-prefixed hex.
    pub fn id_hex(&self) -> String {
        self.id().to_hex()
    }

    /// Decode from `0x`-prefixed hex wire bytes.
    pub fn decode_hex(text: &str) -> Result<Self, PlasmaError> {
        let bytes = hex::decode(text)?;
        Ok(Self::decode(&bytes)?)
    }
}

impl Encodable for Transaction {
    fn to_rlp(&self) -> Rlp {
        Rlp::list(vec![
            self.inputs.to_rlp(),
            self.outputs.to_rlp(),
            self.payload.to_rlp(),
        ])
    }
}

impl Decodable for Transaction {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        let fields = item.as_list_of(3)?;
        let inputs = Vec::<Input>::from_rlp(&fields[0])?;
        let outputs = Vec::<Output>::from_rlp(&fields[1])?;
        if inputs.is_empty() && outputs.is_empty() {
            return Err(CodecError::Invalid("transaction with no inputs and no outputs"));
        }
        Ok(Self {
            inputs,
            outputs,
            payload: fields[2].as_u64()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Root-chain validation helpers
// ---------------------------------------------------------------------------

/// True iff `encoded` decodes to a transaction whose identity id is `claimed_id`.
pub fn validate_encoded(encoded: &[u8], claimed_id: &Hash256) -> bool {
    matches!(Transaction::decode(encoded), Ok(tx) if tx.id() == *claimed_id)
}

/// True iff `signature` over `digest` was produced by `address`.
pub fn validate_signature(digest: &Hash256, address: &Address, signature: &Signature) -> bool {
    verify_address(digest, signature, address)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
