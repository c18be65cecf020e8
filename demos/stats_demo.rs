use std::cmp::Ordering;

use chain_hash::GrowthPolicy;
use chain_hash::HashTable;
use chain_hash::TableError;
use chain_hash::TableOptions;
use chain_hash::hash_fn::hash_i32;
use clap::Parser;
use clap::ValueEnum;
use env_logger::Builder;
use log::LevelFilter;
use log::info;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

const KEY_RANGE: i32 = 99_999_999;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Occupied,
    Entries,
}

impl From<Policy> for GrowthPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Occupied => GrowthPolicy::OccupiedBuckets,
            Policy::Entries => GrowthPolicy::TotalEntries,
        }
    }
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "capacity", default_value_t = 10)]
    capacity: usize,

    #[arg(short = 'n', long = "count", default_value_t = 100_000)]
    count: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    #[arg(short = 'p', long = "policy", value_enum, default_value_t = Policy::Occupied)]
    policy: Policy,

    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Key {
    key: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Value {
    value: i32,
}

fn key_compare(a: &Key, b: &Key) -> Ordering {
    a.key.cmp(&b.key)
}

fn hash_key(key: &Key) -> u64 {
    hash_i32(&key.key)
}

type Table = HashTable<Key, Value, fn(&Key) -> u64, fn(&Key, &Key) -> Ordering>;

/// Inserts from a separate scope; the table keeps its own copies.
fn add(table: &mut Table) -> Result<(), TableError> {
    let key = Key { key: 9953 };
    let value = Value { value: 1002 };
    table.put(key, value)
}

fn init_logger() {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("chain_hash", LevelFilter::Info)
        .format_timestamp_millis()
        .parse_default_env();
    let _ = builder.try_init();
}

fn main() -> Result<(), TableError> {
    init_logger();
    let args = Args::parse();

    let options = TableOptions::new()
        .with_capacity(args.capacity)
        .with_load_factor(args.load_factor)
        .with_growth_policy(args.policy.into());
    let mut table: Table = HashTable::with_options(
        options,
        hash_key as fn(&Key) -> u64,
        key_compare as fn(&Key, &Key) -> Ordering,
    )?;

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    add(&mut table)?;

    let mut duplicates = 0;
    for _ in 0..args.count {
        let key = Key {
            key: rng.random_range(0..KEY_RANGE),
        };
        let value = Value {
            value: rng.random_range(0..KEY_RANGE),
        };
        match table.put(key, value) {
            Ok(()) => {}
            Err(TableError::DuplicateKey) => duplicates += 1,
            Err(err) => return Err(err),
        }
    }
    info!(
        "inserted {} entries ({} duplicate keys skipped)",
        table.len(),
        duplicates
    );

    let found = (0..args.count)
        .filter(|_| {
            let key = Key {
                key: rng.random_range(0..KEY_RANGE),
            };
            table.contains_key(&key)
        })
        .count();
    println!("Found {} / {} random keys!", found, args.count);

    match table.get_key_value(&Key { key: 9953 }) {
        Some((key, value)) => {
            println!("Found Key: {}\nFound Value: {}", key.key, value.value)
        }
        None => println!("Key not found!"),
    }
    println!("Capacity: {}", table.capacity());

    table.stats().print();
    table.print_chain_histogram();

    Ok(())
}
