use crate::{verify_signature, Coin, OutputIndex, Transaction, UtxoId, UtxoPool};
use log::debug;
use std::collections::HashSet;

/// Validates proposed transactions against the current set of unspent outputs and
/// resolves each epoch's candidates into a mutually consistent accepted subset.
///
/// The handler owns a private copy of the pool it is constructed with and evolves it
/// as epochs are processed: an accepted transaction consumes its inputs and makes its
/// outputs spendable for the transactions validated after it.
#[derive(Debug, Clone)]
pub struct TxHandler {
    utxo_pool: UtxoPool,
}

impl TxHandler {
    /// Creates a handler whose ledger state starts from the given pool.
    /// The pool is copied, so the caller's instance is never aliased or mutated.
    pub fn new(utxo_pool: &UtxoPool) -> Self {
        Self {
            utxo_pool: utxo_pool.clone(),
        }
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    /// Returns true if the transaction can be applied to the current pool state:
    ///   - every input references an output that is currently unspent,
    ///   - every input's signature verifies against the referenced output's recipient,
    ///   - no unspent output is claimed by more than one input,
    ///   - no output amount is negative, and
    ///   - the claimed inputs provide at least as much value as the outputs spend.
    pub fn is_valid_tx(&self, transaction: &Transaction) -> bool {
        self.validate_tx(transaction).is_ok()
    }

    /// The same verdict as [TxHandler::is_valid_tx], with a message naming the first
    /// check that failed. The checks are independent, so stopping at the first
    /// failure does not change the verdict.
    pub fn validate_tx(&self, transaction: &Transaction) -> Result<(), String> {
        // Outputs claimed so far by this transaction. Scoped to a single validation,
        // unlike the pool itself.
        let mut claimed = HashSet::new();
        let mut input_total = Coin::zero();
        for (input_index, input) in transaction.inputs().iter().enumerate() {
            let utxo_id = input.utxo_id();
            if !self.utxo_pool.contains(utxo_id) {
                return Err(format!(
                    "Input {} of transaction: {} references an output that is not unspent: {}",
                    input_index,
                    transaction.id(),
                    utxo_id
                ));
            }
            let output = self.utxo_pool.output(utxo_id);
            let signable_data = transaction.signable_data(input_index)?;
            if !verify_signature(output.recipient(), &signable_data, input.signature()) {
                return Err(format!(
                    "Input {} of transaction: {} has an invalid signature.",
                    input_index,
                    transaction.id()
                ));
            }
            if !claimed.insert(*utxo_id) {
                return Err(format!(
                    "Transaction: {} claims the unspent output: {} more than once.",
                    transaction.id(),
                    utxo_id
                ));
            }
            input_total = input_total + output.amount();
        }

        let mut output_total = Coin::zero();
        for output in transaction.outputs() {
            if output.amount().is_negative() {
                return Err(format!(
                    "Transaction: {} has an output with a negative amount: {}.",
                    transaction.id(),
                    output.amount()
                ));
            }
            output_total = output_total + output.amount();
        }

        if input_total < output_total {
            return Err(format!(
                "Transaction: {} spends {} but its inputs only provide {}.",
                transaction.id(),
                output_total,
                input_total
            ));
        }
        Ok(())
    }

    /// Processes one epoch of candidate transactions and returns the accepted subset.
    ///
    /// Candidates are taken in the order given. Each valid transaction is applied
    /// immediately, so its consumed outputs are gone and its new outputs are
    /// spendable for the candidates validated after it. This keeps the accepted
    /// subset self-consistent: no two accepted transactions spend the same output.
    ///
    /// The resolution policy is first-seen-wins. When two candidates conflict, the
    /// one earlier in the slice is accepted, and a different order may yield a
    /// different, possibly larger, accepted subset. No attempt is made to search for
    /// a maximal one.
    pub fn handle_txs(&mut self, candidate_txs: &[Transaction]) -> Vec<Transaction> {
        let mut accepted = Vec::new();
        for transaction in candidate_txs {
            match self.validate_tx(transaction) {
                Ok(()) => {
                    self.apply(transaction);
                    accepted.push(transaction.clone());
                }
                Err(reason) => {
                    debug!("Rejected transaction: {}. {}", transaction.id(), reason);
                }
            }
        }
        accepted
    }

    /// Consumes the transaction's inputs and records its outputs as spendable.
    /// Must only be called with a transaction that passed validation.
    fn apply(&mut self, transaction: &Transaction) {
        for input in transaction.inputs() {
            self.utxo_pool.remove(input.utxo_id());
        }
        for (output_index, output) in transaction.outputs().iter().enumerate() {
            let utxo_id = UtxoId::new(
                *transaction.id(),
                OutputIndex::new(output_index as u32),
            );
            self.utxo_pool.add(utxo_id, output.clone());
        }
    }
}
