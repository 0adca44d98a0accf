//! # UTXO Index
//!
//! An observer-side projection of confirmed transactions into per-address
//! sets of unspent outputs. Wallets and indexers use it to show balances
//! and pick inputs; the exit reconciler never reads it.
//!
//! ## Rules
//!
//! - Every non-null output of an observed transaction becomes an entry
//!   under its recipient. Null outputs (zero address, zero amount) are
//!   placeholders and are skipped.
//! - With pruning enabled (the default), each input of an observed
//!   transaction removes the entry it consumes. An address left with no
//!   entries is dropped from the index.
//! - With pruning disabled the index only ever grows. Balances then count
//!   spent outputs too; this mode exists for replaying histories that
//!   relied on it.
//!
//! Reads never fail. Unknown addresses have no entries and a zero balance.

use std::collections::{BTreeMap, HashMap};

use plasma_core::{Address, ChainConfig, Hash256};
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// One unspent output as seen by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtxoEntry {
    /// Identity id of the transaction that created the output.
    pub tx_id: Hash256,
    /// Index of the output within that transaction.
    pub output_index: u64,
    /// Output amount.
    pub amount: u128,
}

/// Per-address unspent outputs.
///
/// Writers take `&mut self`; share across threads behind a lock.
#[derive(Debug, Clone)]
pub struct UtxoIndex {
    by_address: BTreeMap<Address, Vec<UtxoEntry>>,
    owners: HashMap<(Hash256, u64), Address>,
    prune_spent: bool,
}

impl Default for UtxoIndex {
    fn default() -> Self {
        Self::new(true)
    }
}

impl UtxoIndex {
    /// An empty index. `prune_spent` selects whether inputs remove the
    /// entries they consume.
    pub fn new(prune_spent: bool) -> Self {
        Self {
            by_address: BTreeMap::new(),
            owners: HashMap::new(),
            prune_spent,
        }
    }

    /// An empty index configured from `config.prune_spent_utxos`.
    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.prune_spent_utxos)
    }

    /// Whether inputs remove consumed entries.
    pub fn prunes_spent(&self) -> bool {
        self.prune_spent
    }

    /// Apply one confirmed transaction.
    pub fn add_transaction(&mut self, tx: &Transaction) {
        if self.prune_spent {
            for input in tx.inputs() {
                self.remove(input.source_tx_id(), input.source_output_index());
            }
        }

        let tx_id = tx.id();
        for (index, output) in (0u64..).zip(tx.outputs()) {
            if output.is_none() {
                continue;
            }
            let entry = UtxoEntry {
                tx_id,
                output_index: index,
                amount: output.amount(),
            };
            self.by_address
                .entry(*output.recipient())
                .or_default()
                .push(entry);
            self.owners.insert((tx_id, index), *output.recipient());
            tracing::debug!(
                tx_id = %tx_id,
                output_index = index,
                recipient = %output.recipient(),
                amount = %output.amount(),
                deposit = tx.is_deposit(),
                "utxo added"
            );
        }
    }

    /// Apply confirmed transactions in order.
    pub fn add_transactions<'a>(&mut self, txs: impl IntoIterator<Item = &'a Transaction>) {
        for tx in txs {
            self.add_transaction(tx);
        }
    }

    fn remove(&mut self, tx_id: &Hash256, output_index: u64) {
        let Some(owner) = self.owners.remove(&(*tx_id, output_index)) else {
            return;
        };
        if let Some(entries) = self.by_address.get_mut(&owner) {
            entries.retain(|e| !(e.tx_id == *tx_id && e.output_index == output_index));
            if entries.is_empty() {
                self.by_address.remove(&owner);
            }
        }
        tracing::debug!(tx_id = %tx_id, output_index, owner = %owner, "utxo spent");
    }

    /// Sum of entry amounts for `address`, or over every address for `None`.
    pub fn balance(&self, address: Option<&Address>) -> u128 {
        match address {
            Some(addr) => self.entries(addr).iter().map(|e| e.amount).sum(),
            None => self
                .by_address
                .values()
                .flatten()
                .map(|e| e.amount)
                .sum(),
        }
    }

    /// Entries held by `address`, in observation order.
    pub fn entries(&self, address: &Address) -> &[UtxoEntry] {
        self.by_address
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if output `output_index` of `tx_id` is currently indexed.
    pub fn contains(&self, tx_id: &Hash256, output_index: u64) -> bool {
        self.owners.contains_key(&(*tx_id, output_index))
    }

    /// Number of addresses holding at least one entry.
    pub fn addresses_count(&self) -> usize {
        self.by_address.len()
    }

    /// Number of entries for `address`, or across every address for `None`.
    pub fn outputs_count(&self, address: Option<&Address>) -> usize {
        match address {
            Some(addr) => self.entries(addr).len(),
            None => self.by_address.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Input, Output};
    use plasma_crypto::SigningKeyPair;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_empty_index() {
        let index = UtxoIndex::default();
        assert_eq!(index.balance(None), 0);
        assert_eq!(index.balance(Some(&addr(1))), 0);
        assert_eq!(index.addresses_count(), 0);
        assert_eq!(index.outputs_count(None), 0);
        assert!(index.entries(&addr(1)).is_empty());
    }

    #[test]
    fn test_deposits_accumulate() {
        let mut index = UtxoIndex::default();
        let d1 = Transaction::deposit(addr(1), 1000, 2).unwrap();
        let d2 = Transaction::deposit(addr(1), 500, 3).unwrap();
        index.add_transaction(&d1);
        assert_eq!(index.outputs_count(None), 1);
        assert_eq!(index.outputs_count(Some(&addr(1))), 1);
        assert_eq!(index.addresses_count(), 1);
        assert_eq!(index.balance(Some(&addr(1))), 1000);
        index.add_transaction(&d2);
        assert_eq!(index.balance(Some(&addr(1))), 1500);
        assert_eq!(index.balance(None), 1500);
        assert_eq!(
            index.entries(&addr(1))[0],
            UtxoEntry {
                tx_id: d1.id(),
                output_index: 0,
                amount: 1000
            }
        );
    }

    #[test]
    fn test_spend_moves_balance() {
        let owner = SigningKeyPair::generate();
        let deposit = Transaction::deposit(owner.address(), 1000, 0).unwrap();
        let spend = Transaction::new(
            vec![Input::new(deposit.id(), 0)],
            vec![Output::new(addr(2), 600), Output::new(owner.address(), 400)],
            0,
        )
        .unwrap()
        .sign_input(0, &owner)
        .unwrap();

        let mut index = UtxoIndex::default();
        index.add_transactions([&deposit, &spend]);
        assert_eq!(index.balance(Some(&owner.address())), 400);
        assert_eq!(index.balance(Some(&addr(2))), 600);
        assert_eq!(index.balance(None), 1000);
        assert!(!index.contains(&deposit.id(), 0));
        assert!(index.contains(&spend.id(), 1));
    }

    #[test]
    fn test_fully_spent_address_dropped() {
        let deposit = Transaction::deposit(addr(1), 10, 0).unwrap();
        let spend = Transaction::new(
            vec![Input::new(deposit.id(), 0)],
            vec![Output::new(addr(2), 10)],
            0,
        )
        .unwrap();
        let mut index = UtxoIndex::default();
        index.add_transactions([&deposit, &spend]);
        assert_eq!(index.addresses_count(), 1);
        assert!(index.entries(&addr(1)).is_empty());
    }

    #[test]
    fn test_null_outputs_skipped() {
        let deposit = Transaction::deposit(addr(1), 10, 0).unwrap();
        let exit =
            Transaction::new(vec![Input::new(deposit.id(), 0)], vec![Output::none()], 0).unwrap();
        let mut index = UtxoIndex::default();
        index.add_transactions([&deposit, &exit]);
        assert_eq!(index.outputs_count(None), 0);
        assert_eq!(index.addresses_count(), 0);
    }

    #[test]
    fn test_unknown_input_ignored() {
        let mut index = UtxoIndex::default();
        let tx = Transaction::new(
            vec![Input::new(Hash256::from_bytes([7; 32]), 3)],
            vec![Output::new(addr(4), 1)],
            0,
        )
        .unwrap();
        index.add_transaction(&tx);
        assert_eq!(index.balance(None), 1);
    }

    #[test]
    fn test_insert_only_mode_keeps_spent() {
        let config = ChainConfig {
            prune_spent_utxos: false,
            ..ChainConfig::default()
        };
        let deposit = Transaction::deposit(addr(1), 10, 0).unwrap();
        let spend = Transaction::new(
            vec![Input::new(deposit.id(), 0)],
            vec![Output::new(addr(2), 10)],
            0,
        )
        .unwrap();
        let mut index = UtxoIndex::from_config(&config);
        assert!(!index.prunes_spent());
        index.add_transactions([&deposit, &spend]);
        assert_eq!(index.balance(None), 20);
        assert_eq!(index.addresses_count(), 2);
    }
}
