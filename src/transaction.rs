use crate::{Coin, PublicKey, Sha256, Signature, UtxoId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A double SHA-256 hash of the transaction data.
#[derive(Debug, Hash, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct TransactionId(Sha256);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn new(data: Sha256) -> Self {
        Self(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0.as_slice()
    }
}

/// The index of the transaction output.
#[derive(Debug, Hash, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct OutputIndex(u32);

impl Display for OutputIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OutputIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Spends one unspent output. The signature proves that the owner of the referenced
/// output authorized this transaction, and covers the signable data for the input's
/// position (see [Transaction::signable_data]).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    utxo_id: UtxoId,
    signature: Signature,
}

impl TransactionInput {
    pub fn new(utxo_id: UtxoId, signature: Signature) -> Self {
        Self { utxo_id, signature }
    }

    pub fn utxo_id(&self) -> &UtxoId {
        &self.utxo_id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl Display for TransactionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.utxo_id)
    }
}

/// Pays the given amount to the recipient's public key.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    amount: Coin,
    recipient: PublicKey,
}

impl TransactionOutput {
    pub fn new(amount: Coin, recipient: PublicKey) -> Self {
        Self { amount, recipient }
    }

    pub fn amount(&self) -> Coin {
        self.amount
    }

    pub fn recipient(&self) -> &PublicKey {
        &self.recipient
    }
}

impl Display for TransactionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.amount)
    }
}

/// The byte sequence signed by the owner of the output spent at `input_index`.
/// Signatures are excluded, so the same bytes are reproducible both when signing the
/// transaction and when verifying it later.
#[derive(Serialize)]
struct SignablePayload<'a> {
    input_index: u32,
    utxo_ids: &'a [UtxoId],
    outputs: &'a [TransactionOutput],
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl Transaction {
    pub fn new(
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Self, String> {
        let id = Self::hash_transaction_data(&inputs, &outputs)?;
        let transaction = Self {
            id,
            inputs,
            outputs,
        };
        transaction.validate_format()?;
        Ok(transaction)
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn inputs(&self) -> &Vec<TransactionInput> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Vec<TransactionOutput> {
        &self.outputs
    }

    /// The exact bytes that the owner of the output spent at `input_index` signs.
    pub fn signable_data(&self, input_index: usize) -> Result<Vec<u8>, String> {
        let utxo_ids = self
            .inputs
            .iter()
            .map(|input| *input.utxo_id())
            .collect::<Vec<UtxoId>>();
        Self::signable_data_from(&utxo_ids, &self.outputs, input_index)
    }

    /// Same bytes as [Transaction::signable_data], available before the inputs have
    /// been signed and the transaction assembled.
    pub fn signable_data_from(
        utxo_ids: &[UtxoId],
        outputs: &[TransactionOutput],
        input_index: usize,
    ) -> Result<Vec<u8>, String> {
        bincode::serialize(&SignablePayload {
            input_index: input_index as u32,
            utxo_ids,
            outputs,
        })
        .map_err(|e| e.to_string())
    }

    fn hash_transaction_data(
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
    ) -> Result<TransactionId, String> {
        let mut data = bincode::serialize(inputs).map_err(|e| e.to_string())?;
        data.extend(bincode::serialize(outputs).map_err(|e| e.to_string())?);
        Ok(TransactionId::new(Sha256::digest_twice(&data)))
    }

    /// A well-formed transaction spends at least one output and creates at least one.
    fn validate_format(&self) -> Result<(), String> {
        if self.inputs.is_empty() {
            Err(format!("Transaction: {} has no inputs.", self.id))
        } else if self.outputs.is_empty() {
            Err(format!("Transaction: {} has no outputs.", self.id))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn identical_data_hashes_to_the_same_id() {
        let key_pair = KeyPair::generate();
        let first = transaction(&key_pair, 10);
        let second = transaction(&key_pair, 10);
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn different_outputs_hash_to_different_ids() {
        let key_pair = KeyPair::generate();
        let first = transaction(&key_pair, 10);
        let second = transaction(&key_pair, 11);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn signable_data_excludes_signatures() {
        let key_pair = KeyPair::generate();
        let other_key_pair = KeyPair::generate();
        let utxo_id = test_utxo_id();
        let outputs = vec![TransactionOutput::new(
            Coin::new(10),
            key_pair.public_key().clone(),
        )];
        let data = Transaction::signable_data_from(&[utxo_id], &outputs, 0).unwrap();

        let signed_by_owner = Transaction::new(
            vec![TransactionInput::new(utxo_id, key_pair.sign(&data))],
            outputs.clone(),
        )
        .unwrap();
        let signed_by_other = Transaction::new(
            vec![TransactionInput::new(utxo_id, other_key_pair.sign(&data))],
            outputs,
        )
        .unwrap();

        assert_eq!(
            signed_by_owner.signable_data(0).unwrap(),
            signed_by_other.signable_data(0).unwrap()
        );
        // The identifier covers the signatures, so the transactions are distinct.
        assert_ne!(signed_by_owner.id(), signed_by_other.id());
    }

    #[test]
    fn signable_data_differs_per_input_position() {
        let key_pair = KeyPair::generate();
        let utxo_ids = [test_utxo_id(), test_utxo_id()];
        let outputs = vec![TransactionOutput::new(
            Coin::new(10),
            key_pair.public_key().clone(),
        )];
        assert_ne!(
            Transaction::signable_data_from(&utxo_ids, &outputs, 0).unwrap(),
            Transaction::signable_data_from(&utxo_ids, &outputs, 1).unwrap()
        );
    }

    #[test]
    fn transaction_without_inputs_is_malformed() {
        let key_pair = KeyPair::generate();
        let outputs = vec![TransactionOutput::new(
            Coin::new(10),
            key_pair.public_key().clone(),
        )];
        assert!(Transaction::new(vec![], outputs).is_err());
    }

    #[test]
    fn transaction_without_outputs_is_malformed() {
        let key_pair = KeyPair::generate();
        let data = Transaction::signable_data_from(&[test_utxo_id()], &[], 0).unwrap();
        let inputs = vec![TransactionInput::new(test_utxo_id(), key_pair.sign(&data))];
        assert!(Transaction::new(inputs, vec![]).is_err());
    }

    fn test_utxo_id() -> UtxoId {
        UtxoId::new(
            TransactionId::new(Sha256::digest(b"previous transaction")),
            OutputIndex::new(0),
        )
    }

    fn transaction(key_pair: &KeyPair, amount: i64) -> Transaction {
        let utxo_id = test_utxo_id();
        let outputs = vec![TransactionOutput::new(
            Coin::new(amount),
            key_pair.public_key().clone(),
        )];
        let data = Transaction::signable_data_from(&[utxo_id], &outputs, 0).unwrap();
        let inputs = vec![TransactionInput::new(utxo_id, key_pair.sign(&data))];
        Transaction::new(inputs, outputs).unwrap()
    }
}
