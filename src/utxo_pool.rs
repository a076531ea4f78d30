use crate::{Coin, OutputIndex, TransactionId, TransactionOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Identifies a single transaction output: the transaction that created it and the
/// output's index within that transaction.
#[derive(Debug, Hash, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct UtxoId {
    transaction_id: TransactionId,
    output_index: OutputIndex,
}

impl UtxoId {
    pub fn new(transaction_id: TransactionId, output_index: OutputIndex) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn output_index(&self) -> &OutputIndex {
        &self.output_index
    }
}

impl Display for UtxoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.output_index)
    }
}

/// A pool of confirmed and unspent transaction outputs, i.e. the outputs that are
/// currently spendable. Each output appears at most once.
/// Cloning the pool yields an independent copy whose mutations are not visible to
/// the original.
#[derive(Debug, Clone)]
pub struct UtxoPool {
    utxos: HashMap<UtxoId, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    pub fn contains(&self, utxo_id: &UtxoId) -> bool {
        self.utxos.contains_key(utxo_id)
    }

    /// Returns the unspent output with the given id.
    /// Callers must check [UtxoPool::contains] first; asking for an absent id is a bug.
    pub fn output(&self, utxo_id: &UtxoId) -> &TransactionOutput {
        match self.utxos.get(utxo_id) {
            Some(output) => output,
            None => panic!("No unspent output with id: {}", utxo_id),
        }
    }

    /// Inserts the output under the given id, overwriting any previous entry.
    pub fn add(&mut self, utxo_id: UtxoId, output: TransactionOutput) {
        self.utxos.insert(utxo_id, output);
    }

    /// Removes the entry with the given id. Removing an absent id has no effect.
    pub fn remove(&mut self, utxo_id: &UtxoId) {
        self.utxos.remove(utxo_id);
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn utxo_ids(&self) -> Vec<UtxoId> {
        self.utxos.keys().map(|utxo_id| *utxo_id).collect()
    }

    /// The total spendable value across all outputs in the pool.
    pub fn total_value(&self) -> Coin {
        self.utxos.values().map(TransactionOutput::amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyPair, Sha256};

    #[test]
    fn add_contains_remove() {
        let mut pool = UtxoPool::new();
        let utxo_id = utxo_id(0);
        assert!(!pool.contains(&utxo_id));

        pool.add(utxo_id, output(10));
        assert!(pool.contains(&utxo_id));
        assert_eq!(pool.output(&utxo_id).amount(), Coin::new(10));
        assert_eq!(pool.len(), 1);

        pool.remove(&utxo_id);
        assert!(!pool.contains(&utxo_id));
        assert!(pool.is_empty());
    }

    #[test]
    fn removing_an_absent_id_is_a_no_op() {
        let mut pool = UtxoPool::new();
        pool.add(utxo_id(0), output(10));
        pool.remove(&utxo_id(1));
        pool.remove(&utxo_id(1));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn adding_the_same_id_overwrites_the_output() {
        let mut pool = UtxoPool::new();
        pool.add(utxo_id(0), output(10));
        pool.add(utxo_id(0), output(25));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.output(&utxo_id(0)).amount(), Coin::new(25));
    }

    #[test]
    #[should_panic(expected = "No unspent output")]
    fn asking_for_an_absent_output_panics() {
        let pool = UtxoPool::new();
        pool.output(&utxo_id(0));
    }

    #[test]
    fn cloned_pool_is_independent() {
        let mut original = UtxoPool::new();
        original.add(utxo_id(0), output(10));

        let mut copy = original.clone();
        copy.remove(&utxo_id(0));
        copy.add(utxo_id(1), output(20));

        assert!(original.contains(&utxo_id(0)));
        assert!(!original.contains(&utxo_id(1)));
    }

    #[test]
    fn total_value_sums_all_outputs() {
        let mut pool = UtxoPool::new();
        assert_eq!(pool.total_value(), Coin::zero());
        pool.add(utxo_id(0), output(10));
        pool.add(utxo_id(1), output(32));
        assert_eq!(pool.total_value(), Coin::new(42));
    }

    fn utxo_id(index: u32) -> UtxoId {
        UtxoId::new(
            TransactionId::new(Sha256::digest(b"some transaction")),
            OutputIndex::new(index),
        )
    }

    fn output(amount: i64) -> TransactionOutput {
        let key_pair = KeyPair::generate();
        TransactionOutput::new(Coin::new(amount), key_pair.public_key().clone())
    }
}
