use clearcoin_lib::{
    Coin, KeyPair, OutputIndex, Sha256, Transaction, TransactionId, TransactionInput,
    TransactionOutput, TxHandler, UtxoId, UtxoPool,
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

const NUM_TRANSACTIONS: usize = 1_000;

/// One minted output per candidate transaction, so that every candidate is valid and
/// the benchmark measures the full validate-and-apply path.
fn create_epoch(wallet: &KeyPair) -> (UtxoPool, Vec<Transaction>) {
    let mint_id = TransactionId::new(Sha256::digest(b"benchmark mint"));
    let mut pool = UtxoPool::new();
    let mut candidates = Vec::with_capacity(NUM_TRANSACTIONS);
    for index in 0..NUM_TRANSACTIONS {
        let utxo_id = UtxoId::new(mint_id, OutputIndex::new(index as u32));
        pool.add(
            utxo_id,
            TransactionOutput::new(Coin::new(50), wallet.public_key().clone()),
        );
        let outputs = vec![TransactionOutput::new(
            Coin::new(50),
            wallet.public_key().clone(),
        )];
        let data = Transaction::signable_data_from(&[utxo_id], &outputs, 0).unwrap();
        let inputs = vec![TransactionInput::new(utxo_id, wallet.sign(&data))];
        candidates.push(Transaction::new(inputs, outputs).unwrap());
    }
    (pool, candidates)
}

fn handle_txs_benchmark(c: &mut Criterion) {
    let wallet = KeyPair::generate();
    let (pool, candidates) = create_epoch(&wallet);
    let handler = TxHandler::new(&pool);

    let mut group = c.benchmark_group("Epoch resolution");
    group.throughput(Throughput::Elements(NUM_TRANSACTIONS as u64));
    group.sample_size(10);
    group.bench_function("handle_txs with 1000 valid transactions", |b| {
        b.iter_batched(
            || handler.clone(),
            |mut handler| handler.handle_txs(&candidates),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, handle_txs_benchmark);

criterion_main!(benches);
