//! # Root-Chain Collaborator
//!
//! The narrow call/event surface of the settlement contract, as the child
//! chain consumes it, plus an in-memory implementation for operators'
//! test harnesses and local simulation.
//!
//! ## Header Chain
//!
//! `InMemoryRootChain` enforces what the contract enforces: headers are
//! numbered densely from 0, each header's `parent_hash` is the previous
//! header's hash, and the first header's parent is zero. A deposit appends
//! its own one-transaction header whose Merkle root is the deposit id.
//!
//! Operator authorization is not modelled. Every submission is attributed
//! to the operator address the chain was created with.

use parking_lot::RwLock;
use plasma_core::{Address, ChainConfig, Decodable, Hash256, PlasmaError, UnixTime};
use plasma_ledger::{Header, Transaction};
use serde::{Deserialize, Serialize};

use crate::exit::{ExitReconciler, ExitState, HeaderSource, WithdrawalRequest};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted when a header is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSubmittedEvent {
    /// Operator the submission is attributed to.
    pub operator: Address,
    /// Number the header was stored under.
    pub header_number: u64,
    /// Typed-tuple hash of the stored header.
    pub header_hash: Hash256,
}

/// Emitted when funds enter the child chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    /// Depositor, who also owns the new child-chain output.
    pub from: Address,
    /// Amount moved onto the child chain.
    pub amount: u128,
    /// Number of the header recording the deposit.
    pub header_number: u64,
}

/// Emitted when a withdrawal is paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawEvent {
    /// Owner of the withdrawn output.
    pub to: Address,
    /// Amount paid out.
    pub amount: u128,
    /// Identity id of the exit transaction.
    pub exit_tx_id: Hash256,
}

/// Any root-chain event, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RootChainEvent {
    /// A header was appended.
    HeaderSubmitted(HeaderSubmittedEvent),
    /// Funds entered the child chain.
    Deposit(DepositEvent),
    /// An output was paid out.
    Withdraw(WithdrawEvent),
}

/// Result of a deposit: both events and the deposit transaction the
/// child chain must treat as the new output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositReceipt {
    /// The deposit event.
    pub deposit: DepositEvent,
    /// The event for the header recording the deposit.
    pub header: HeaderSubmittedEvent,
    /// The one-output deposit transaction.
    pub transaction: Transaction,
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// The settlement contract's call surface.
pub trait RootChain: HeaderSource {
    /// Append the RLP-encoded header `encoded_header` as number `index`.
    fn submit_header(
        &self,
        index: u64,
        encoded_header: &[u8],
    ) -> Result<HeaderSubmittedEvent, PlasmaError>;

    /// Credit `amount` to `recipient` on the child chain.
    fn deposit(&self, recipient: Address, amount: u128) -> Result<DepositReceipt, PlasmaError>;

    /// Pay out one child-chain output, at most once.
    fn withdraw(&self, request: &WithdrawalRequest) -> Result<WithdrawEvent, PlasmaError>;

    /// The header at `index`, as the contract's `headers(index)` getter.
    fn headers(&self, index: u64) -> Option<Header> {
        self.header(index)
    }
}

// ---------------------------------------------------------------------------
// In-memory root chain
// ---------------------------------------------------------------------------

/// A root chain held in process memory.
#[derive(Debug)]
pub struct InMemoryRootChain {
    config: ChainConfig,
    operator: Address,
    headers: RwLock<Vec<Header>>,
    events: RwLock<Vec<RootChainEvent>>,
    reconciler: ExitReconciler,
}

impl InMemoryRootChain {
    /// An empty chain operated by `operator`.
    pub fn new(config: ChainConfig, operator: Address) -> Self {
        Self {
            config,
            operator,
            headers: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            reconciler: ExitReconciler::new(),
        }
    }

    /// The configuration the chain was created with.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Address every header submission is attributed to.
    pub fn operator(&self) -> &Address {
        &self.operator
    }

    /// Number of submitted headers; also the number the next one gets.
    pub fn header_count(&self) -> u64 {
        self.headers.read().len() as u64
    }

    /// Hash of the last header, or zero before the first.
    pub fn tip_hash(&self) -> Hash256 {
        self.headers
            .read()
            .last()
            .map(Header::hash)
            .unwrap_or(Hash256::ZERO)
    }

    /// Withdrawal state of an output.
    pub fn exit_state(&self, tx_id: &Hash256, output_index: u64) -> ExitState {
        self.reconciler.state(tx_id, output_index)
    }

    /// All events emitted so far.
    pub fn events(&self) -> Vec<RootChainEvent> {
        self.events.read().clone()
    }

    fn append(&self, headers: &mut Vec<Header>, header: Header) -> HeaderSubmittedEvent {
        let event = HeaderSubmittedEvent {
            operator: self.operator,
            header_number: headers.len() as u64,
            header_hash: header.hash(),
        };
        headers.push(header);
        tracing::info!(
            header_number = event.header_number,
            header_hash = %event.header_hash,
            merkle_root = %header.merkle_root(),
            "header appended"
        );
        self.events
            .write()
            .push(RootChainEvent::HeaderSubmitted(event.clone()));
        event
    }
}

impl HeaderSource for InMemoryRootChain {
    fn header(&self, number: u64) -> Option<Header> {
        self.headers.read().as_slice().header(number)
    }
}

impl RootChain for InMemoryRootChain {
    fn submit_header(
        &self,
        index: u64,
        encoded_header: &[u8],
    ) -> Result<HeaderSubmittedEvent, PlasmaError> {
        let header = Header::decode(encoded_header)?;
        let mut headers = self.headers.write();

        let expected = headers.len() as u64;
        if index != expected {
            return Err(PlasmaError::HeaderRejected(format!(
                "header number {index} submitted, expected {expected}"
            )));
        }
        let parent = headers.last().map(Header::hash).unwrap_or(Hash256::ZERO);
        if *header.parent_hash() != parent {
            return Err(PlasmaError::HeaderRejected(format!(
                "parent hash {} does not match tip {parent}",
                header.parent_hash()
            )));
        }

        Ok(self.append(&mut headers, header))
    }

    fn deposit(&self, recipient: Address, amount: u128) -> Result<DepositReceipt, PlasmaError> {
        let mut headers = self.headers.write();
        let header_number = headers.len() as u64;
        let transaction = Transaction::deposit(recipient, amount, header_number)?;
        let parent = headers.last().map(Header::hash).unwrap_or(Hash256::ZERO);
        let header = Header::with_timestamp(
            self.config.header_version,
            parent,
            transaction.id(),
            UnixTime::now(),
        );

        let deposit = DepositEvent {
            from: recipient,
            amount,
            header_number,
        };
        tracing::info!(
            recipient = %recipient,
            amount = %amount,
            header_number,
            tx_id = %transaction.id(),
            "deposit recorded"
        );
        self.events
            .write()
            .push(RootChainEvent::Deposit(deposit.clone()));
        let header = self.append(&mut headers, header);

        Ok(DepositReceipt {
            deposit,
            header,
            transaction,
        })
    }

    fn withdraw(&self, request: &WithdrawalRequest) -> Result<WithdrawEvent, PlasmaError> {
        for tx in [&request.spend_tx, &request.exit_tx] {
            self.config
                .check_shape(tx.inputs().len(), tx.outputs().len())?;
        }
        let auth = self.reconciler.authorize(self, request)?;
        let event = WithdrawEvent {
            to: auth.recipient,
            amount: auth.amount,
            exit_tx_id: auth.exit_tx_id,
        };
        self.events
            .write()
            .push(RootChainEvent::Withdraw(event.clone()));
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasma_core::Encodable;

    fn chain() -> InMemoryRootChain {
        InMemoryRootChain::new(ChainConfig::default(), Address::from_bytes([0xee; 20]))
    }

    fn root(n: &str) -> Hash256 {
        Hash256::from_hex(n).unwrap()
    }

    #[test]
    fn test_submit_genesis_and_child() {
        let chain = chain();
        let h0 = Header::new(0, Hash256::ZERO, root("0x1"));
        let event = chain.submit_header(0, h0.to_canonical().as_bytes()).unwrap();
        assert_eq!(event.header_number, 0);
        assert_eq!(event.header_hash, h0.hash());
        assert_eq!(event.operator, *chain.operator());
        assert_eq!(chain.headers(0), Some(h0));

        let h1 = Header::new(0, h0.hash(), root("0x2"));
        let event = chain.submit_header(1, h1.to_canonical().as_bytes()).unwrap();
        assert_eq!(event.header_number, 1);
        assert_eq!(chain.tip_hash(), h1.hash());
        assert_eq!(chain.header_count(), 2);
    }

    #[test]
    fn test_gap_in_numbering_rejected() {
        let chain = chain();
        let h0 = Header::new(0, Hash256::ZERO, root("0x1"));
        assert!(matches!(
            chain.submit_header(1, h0.to_canonical().as_bytes()),
            Err(PlasmaError::HeaderRejected(_))
        ));
        assert_eq!(chain.header_count(), 0);
    }

    #[test]
    fn test_wrong_parent_rejected() {
        let chain = chain();
        let h0 = Header::new(0, Hash256::ZERO, root("0x1"));
        chain.submit_header(0, h0.to_canonical().as_bytes()).unwrap();
        let orphan = Header::new(0, root("0xbad"), root("0x2"));
        assert!(matches!(
            chain.submit_header(1, orphan.to_canonical().as_bytes()),
            Err(PlasmaError::HeaderRejected(_))
        ));
    }

    #[test]
    fn test_genesis_parent_must_be_zero() {
        let chain = chain();
        let h0 = Header::new(0, root("0x5"), root("0x1"));
        assert!(chain.submit_header(0, h0.to_canonical().as_bytes()).is_err());
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(matches!(
            chain().submit_header(0, &[0xc0]),
            Err(PlasmaError::Codec(_))
        ));
    }

    #[test]
    fn test_deposit_appends_header() {
        let chain = chain();
        let recipient = Address::from_bytes([1; 20]);
        let receipt = chain.deposit(recipient, 1000).unwrap();
        assert_eq!(receipt.deposit.header_number, 0);
        assert_eq!(receipt.deposit.amount, 1000);
        assert!(receipt.transaction.is_deposit());
        assert_eq!(receipt.transaction.payload(), 0);

        let header = chain.headers(0).unwrap();
        assert_eq!(*header.merkle_root(), receipt.transaction.id());
        assert_eq!(*header.parent_hash(), Hash256::ZERO);
        assert_eq!(receipt.header.header_hash, header.hash());

        let events = chain.events();
        assert!(matches!(events[0], RootChainEvent::Deposit(_)));
        assert!(matches!(events[1], RootChainEvent::HeaderSubmitted(_)));
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let chain = chain();
        assert!(matches!(
            chain.deposit(Address::from_bytes([1; 20]), 0),
            Err(PlasmaError::InvalidShape(_))
        ));
        assert_eq!(chain.header_count(), 0);
        assert!(chain.events().is_empty());
    }

    #[test]
    fn test_deposit_header_uses_configured_version() {
        let config = ChainConfig {
            header_version: 4,
            ..ChainConfig::default()
        };
        let chain = InMemoryRootChain::new(config, Address::ZERO);
        chain.deposit(Address::from_bytes([1; 20]), 1).unwrap();
        assert_eq!(chain.headers(0).unwrap().version(), 4);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = RootChainEvent::Withdraw(WithdrawEvent {
            to: Address::ZERO,
            amount: 5,
            exit_tx_id: Hash256::ZERO,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Withdraw");
        assert_eq!(json["amount"], 5);
    }
}
