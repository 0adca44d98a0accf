//! # Exit Reconciler — Withdrawal State Machine
//!
//! Decides whether a holder may withdraw a child-chain output on the root
//! chain, and records each output that has been paid out.
//!
//! ## States
//!
//! ```text
//! Unclaimed ──▶ Withdrawn (terminal)
//! ```
//!
//! An output with no exit record is `Unclaimed`. The record is created by
//! the first successful authorization and never reset.
//!
//! ## Authorization
//!
//! A request names a spend transaction `T` included under header `h1`, an
//! output index `i` of `T`, and an exit transaction `E` included under a
//! later header `h2`. It is authorized iff:
//!
//! 1. `h2 > h1`, and both inclusion proofs reconstruct their header roots;
//! 2. `E` has an input spending `(T.id(), i)` whose signature recovers to
//!    the recipient of `T`'s output `i`;
//! 3. `(T.id(), i)` is still `Unclaimed`.
//!
//! ## Security Invariant
//!
//! The state check and the transition to `Withdrawn` happen under the
//! store's per-key entry lock, so concurrent requests for one output cannot
//! both observe `Unclaimed`. A rejected request never alters the state of
//! any output.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use plasma_core::{hex, Address, Decodable, Hash256, PlasmaError, UnixTime};
use plasma_crypto::{verify_proof, MerkleProof};
use plasma_ledger::{Header, Transaction};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Exit state
// ---------------------------------------------------------------------------

/// Withdrawal state of one child-chain output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitState {
    /// Not yet paid out on the root chain.
    Unclaimed,
    /// Paid out (terminal).
    Withdrawn,
}

impl ExitState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawn)
    }
}

impl std::fmt::Display for ExitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unclaimed => "UNCLAIMED",
            Self::Withdrawn => "WITHDRAWN",
        };
        f.write_str(s)
    }
}

/// Record of a completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRecord {
    /// Identity id of the transaction that created the output.
    pub tx_id: Hash256,
    /// Index of the output within that transaction.
    pub output_index: u64,
    /// Address the payout went to.
    pub recipient: Address,
    /// Amount paid out.
    pub amount: u128,
    /// Identity id of the exit transaction that confirmed the spend.
    pub exit_tx_id: Hash256,
    /// When the withdrawal was authorized.
    pub withdrawn_at: UnixTime,
}

// ---------------------------------------------------------------------------
// Exit store
// ---------------------------------------------------------------------------

/// Exit records keyed by `(tx_id, output_index)`.
///
/// Thread-safe via `DashMap`. [`try_withdraw`](Self::try_withdraw) holds the
/// shard write lock across the check and the insert.
pub struct ExitStore {
    records: DashMap<(Hash256, u64), ExitRecord>,
}

impl ExitStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Current state of output `output_index` of `tx_id`.
    pub fn state(&self, tx_id: &Hash256, output_index: u64) -> ExitState {
        if self.records.contains_key(&(*tx_id, output_index)) {
            ExitState::Withdrawn
        } else {
            ExitState::Unclaimed
        }
    }

    /// The exit record for an output, if it has been withdrawn.
    pub fn get(&self, tx_id: &Hash256, output_index: u64) -> Option<ExitRecord> {
        self.records
            .get(&(*tx_id, output_index))
            .map(|r| r.value().clone())
    }

    /// Transition the record's output from `Unclaimed` to `Withdrawn`.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::AlreadyWithdrawn` if a record already exists;
    /// the existing record is left untouched.
    pub fn try_withdraw(&self, record: ExitRecord) -> Result<(), PlasmaError> {
        match self.records.entry((record.tx_id, record.output_index)) {
            Entry::Occupied(_) => Err(PlasmaError::AlreadyWithdrawn {
                tx_id: record.tx_id,
                output_index: record.output_index,
            }),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// All exit records, in no particular order.
    pub fn records(&self) -> Vec<ExitRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of withdrawn outputs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been withdrawn.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ExitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitStore")
            .field("withdrawn_count", &self.records.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Header access
// ---------------------------------------------------------------------------

/// Read access to submitted headers by number.
pub trait HeaderSource {
    /// The header at `number`, if one has been submitted.
    fn header(&self, number: u64) -> Option<Header>;
}

impl HeaderSource for [Header] {
    fn header(&self, number: u64) -> Option<Header> {
        usize::try_from(number).ok().and_then(|i| self.get(i)).copied()
    }
}

impl HeaderSource for Vec<Header> {
    fn header(&self, number: u64) -> Option<Header> {
        self.as_slice().header(number)
    }
}

// ---------------------------------------------------------------------------
// Withdrawal request
// ---------------------------------------------------------------------------

/// Everything a holder presents to withdraw one output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Number of the header whose block includes the spend transaction.
    pub spend_header: u64,
    /// The transaction that created the output being withdrawn.
    pub spend_tx: Transaction,
    /// Inclusion proof of `spend_tx.id()` under the spend header's root.
    pub spend_proof: MerkleProof,
    /// Index of the withdrawn output within `spend_tx`.
    pub output_index: u64,
    /// Number of the later header whose block includes the exit transaction.
    pub exit_header: u64,
    /// The transaction spending the output, signed by its owner.
    pub exit_tx: Transaction,
    /// Inclusion proof of `exit_tx.id()` under the exit header's root.
    pub exit_proof: MerkleProof,
}

impl WithdrawalRequest {
    /// Build a request from wire bytes: RLP-encoded transactions and flat
    /// concatenated proofs, as a root-chain `withdraw` call carries them.
    pub fn from_encoded(
        spend_header: u64,
        encoded_spend_tx: &[u8],
        spend_proof: &[u8],
        output_index: u64,
        exit_header: u64,
        encoded_exit_tx: &[u8],
        exit_proof: &[u8],
    ) -> Result<Self, PlasmaError> {
        Ok(Self {
            spend_header,
            spend_tx: Transaction::decode(encoded_spend_tx)?,
            spend_proof: MerkleProof::from_flat_bytes(spend_proof)?,
            output_index,
            exit_header,
            exit_tx: Transaction::decode(encoded_exit_tx)?,
            exit_proof: MerkleProof::from_flat_bytes(exit_proof)?,
        })
    }
}

/// A granted withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalAuthorization {
    /// Identity id of the spend transaction.
    pub tx_id: Hash256,
    /// Withdrawn output index.
    pub output_index: u64,
    /// Payout address, recovered from the exit signature.
    pub recipient: Address,
    /// Payout amount.
    pub amount: u128,
    /// Identity id of the exit transaction.
    pub exit_tx_id: Hash256,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Authorizes withdrawals at most once per output.
#[derive(Debug, Default)]
pub struct ExitReconciler {
    store: ExitStore,
}

impl ExitReconciler {
    /// A reconciler with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reconciler over an existing store.
    pub fn with_store(store: ExitStore) -> Self {
        Self { store }
    }

    /// The underlying exit store.
    pub fn store(&self) -> &ExitStore {
        &self.store
    }

    /// Current state of output `output_index` of `tx_id`.
    pub fn state(&self, tx_id: &Hash256, output_index: u64) -> ExitState {
        self.store.state(tx_id, output_index)
    }

    /// Check `request` against `headers` and, if valid, mark the output
    /// `Withdrawn`.
    ///
    /// # Errors
    ///
    /// - `ProofInvalid` if `exit_header <= spend_header` or either proof
    ///   fails against its header root.
    /// - `UnknownHeader` if either header has not been submitted.
    /// - `OutputIndexOutOfRange` if `output_index` is past the spend's outputs.
    /// - `NotOwner` if the exit does not spend the output with the owner's
    ///   signature.
    /// - `AlreadyWithdrawn` if the output was paid out before.
    pub fn authorize<H>(
        &self,
        headers: &H,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalAuthorization, PlasmaError>
    where
        H: HeaderSource + ?Sized,
    {
        let tx_id = request.spend_tx.id();
        match self.reconcile(headers, request, tx_id) {
            Ok(auth) => {
                tracing::info!(
                    tx_id = %auth.tx_id,
                    output_index = auth.output_index,
                    recipient = %auth.recipient,
                    amount = %auth.amount,
                    exit_tx_id = %auth.exit_tx_id,
                    "withdrawal authorized"
                );
                Ok(auth)
            }
            Err(e) => {
                tracing::warn!(
                    tx_id = %tx_id,
                    output_index = request.output_index,
                    reason = %e,
                    "withdrawal rejected"
                );
                Err(e)
            }
        }
    }

    fn reconcile<H>(
        &self,
        headers: &H,
        request: &WithdrawalRequest,
        tx_id: Hash256,
    ) -> Result<WithdrawalAuthorization, PlasmaError>
    where
        H: HeaderSource + ?Sized,
    {
        if request.exit_header <= request.spend_header {
            return Err(PlasmaError::ProofInvalid(format!(
                "exit header {} is not after spend header {}",
                request.exit_header, request.spend_header
            )));
        }

        let spend_root = header_root(headers, request.spend_header)?;
        if !verify_proof(&spend_root, &tx_id, &request.spend_proof) {
            return Err(PlasmaError::ProofInvalid(format!(
                "spend transaction {tx_id} not included under header {}",
                request.spend_header
            )));
        }

        let exit_tx_id = request.exit_tx.id();
        let exit_root = header_root(headers, request.exit_header)?;
        if !verify_proof(&exit_root, &exit_tx_id, &request.exit_proof) {
            return Err(PlasmaError::ProofInvalid(format!(
                "exit transaction {exit_tx_id} not included under header {}",
                request.exit_header
            )));
        }

        let output = request.spend_tx.output(request.output_index)?;
        let owner = *output.recipient();
        let signed_by_owner = request
            .exit_tx
            .inputs()
            .iter()
            .filter(|input| input.spends(&tx_id, request.output_index))
            .any(|input| request.exit_tx.verify(input.signature(), &owner));
        if !signed_by_owner {
            return Err(PlasmaError::NotOwner {
                tx_id,
                output_index: request.output_index,
            });
        }

        let record = ExitRecord {
            tx_id,
            output_index: request.output_index,
            recipient: owner,
            amount: output.amount(),
            exit_tx_id,
            withdrawn_at: UnixTime::now(),
        };
        self.store.try_withdraw(record)?;

        Ok(WithdrawalAuthorization {
            tx_id,
            output_index: request.output_index,
            recipient: owner,
            amount: output.amount(),
            exit_tx_id,
        })
    }
}

fn header_root<H>(headers: &H, number: u64) -> Result<Hash256, PlasmaError>
where
    H: HeaderSource + ?Sized,
{
    headers
        .header(number)
        .map(|h| *h.merkle_root())
        .ok_or(PlasmaError::UnknownHeader(number))
}

/// Flat proof bytes as `0x`-prefixed hex, the form wallets pass to `withdraw`.
pub fn proof_hex(proof: &MerkleProof) -> String {
    hex::encode_prefixed(&proof.to_flat_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
