use crate::{
    Coin, KeyPair, OutputIndex, Sha256, Transaction, TransactionId, TransactionInput,
    TransactionOutput, TxHandler, UtxoId, UtxoPool,
};
use clap::{App, Arg, ArgMatches};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;

struct SimulationCliOptions {
    wallets: usize,
    epochs: usize,
    transactions_per_epoch: usize,
    seed: u64,
}

impl SimulationCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            wallets: matches.value_of_t::<usize>("wallets")?,
            epochs: matches.value_of_t::<usize>("epochs")?,
            transactions_per_epoch: matches.value_of_t::<usize>("transactions-per-epoch")?,
            seed: matches.value_of_t::<u64>("seed")?,
        })
    }
}

pub fn simulation_command() -> App<'static> {
    App::new("simulate")
        .version("0.1")
        .about("Runs randomly generated epochs through a transaction handler and reports what was accepted.")
        .arg(
            Arg::new("wallets")
                .short('w')
                .long("wallets")
                .value_name("COUNT")
                .about("Number of wallets that own and receive coins.")
                .takes_value(true)
                .required(false)
                .default_value("4"),
        )
        .arg(
            Arg::new("epochs")
                .short('e')
                .long("epochs")
                .value_name("COUNT")
                .about("Number of epochs to resolve.")
                .takes_value(true)
                .required(false)
                .default_value("3"),
        )
        .arg(
            Arg::new("transactions-per-epoch")
                .short('t')
                .long("transactions-per-epoch")
                .value_name("COUNT")
                .about("Number of candidate transactions generated for each epoch.")
                .takes_value(true)
                .required(false)
                .default_value("8"),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("SEED")
                .about("Seed for the random generator, so that runs are reproducible.")
                .takes_value(true)
                .required(false)
                .default_value("42"),
        )
}

pub fn run_simulation_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let options = SimulationCliOptions::parse(matches)?;
    let mut rng = StdRng::seed_from_u64(options.seed);
    let wallets = (0..options.wallets)
        .map(|_| KeyPair::generate())
        .collect::<Vec<KeyPair>>();

    // Mint one output per wallet so that every wallet starts with coins to spend.
    let mut pool = UtxoPool::new();
    let mint_id = TransactionId::new(Sha256::digest(b"clearcoin simulation mint"));
    for (index, wallet) in wallets.iter().enumerate() {
        let utxo_id = UtxoId::new(mint_id, OutputIndex::new(index as u32));
        let amount = Coin::new(rng.gen_range(10..100));
        pool.add(
            utxo_id,
            TransactionOutput::new(amount, wallet.public_key().clone()),
        );
    }
    println!(
        "Starting pool holds {} unspent outputs worth {}.",
        pool.len(),
        pool.total_value()
    );

    let mut handler = TxHandler::new(&pool);
    for epoch in 0..options.epochs {
        let candidates = generate_candidates(
            &mut rng,
            &wallets,
            handler.utxo_pool(),
            options.transactions_per_epoch,
        )?;
        let accepted = handler.handle_txs(&candidates);
        for transaction in &accepted {
            info!("Epoch {} accepted transaction: {}", epoch, transaction.id());
        }
        println!(
            "Epoch {}: accepted {} of {} candidates. The pool now holds {} outputs worth {}.",
            epoch,
            accepted.len(),
            candidates.len(),
            handler.utxo_pool().len(),
            handler.utxo_pool().total_value()
        );
    }
    Ok(())
}

/// Generates candidate transactions that spend outputs from the given pool.
/// Candidates are drawn from the pool as it is at the start of the epoch, so several
/// of them may compete for the same output, and some deliberately overspend it.
fn generate_candidates(
    rng: &mut StdRng,
    wallets: &[KeyPair],
    pool: &UtxoPool,
    count: usize,
) -> Result<Vec<Transaction>, Box<dyn Error>> {
    let utxo_ids = pool.utxo_ids();
    if utxo_ids.is_empty() {
        return Err("The pool has no outputs left to spend.".into());
    }

    let mut candidates = Vec::with_capacity(count);
    for _ in 0..count {
        let utxo_id = utxo_ids[rng.gen_range(0..utxo_ids.len())];
        let output = pool.output(&utxo_id);
        let owner = wallets
            .iter()
            .find(|wallet| wallet.public_key() == output.recipient())
            .ok_or("No wallet owns the selected output.")?;
        let recipient = &wallets[rng.gen_range(0..wallets.len())];

        // Roughly one in five candidates tries to spend more than the output
        // provides and is expected to be rejected.
        let amount = if rng.gen_range(0..5) == 0 {
            output.amount() + Coin::new(1)
        } else {
            output.amount()
        };
        let outputs = vec![TransactionOutput::new(
            amount,
            recipient.public_key().clone(),
        )];
        let data = Transaction::signable_data_from(&[utxo_id], &outputs, 0)?;
        let inputs = vec![TransactionInput::new(utxo_id, owner.sign(&data))];
        candidates.push(Transaction::new(inputs, outputs)?);
    }
    Ok(candidates)
}
