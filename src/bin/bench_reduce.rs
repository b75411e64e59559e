//! Benchmark equivalence reduction at large scales.
//!
//! Run with: cargo run --release --bin bench_reduce
//!
//! Usage:
//!   bench_reduce                 Run default size (100k pairs)
//!   bench_reduce 100k 1m         Run multiple sizes
//!   bench_reduce --chain         One long chain instead of a random forest
//!   bench_reduce --units 4       Dedicated pool with 4 workers
//!   bench_reduce -n 10           Run 10 iterations (for profiling)
//!
//! For per-phase timing, build with `--features timing` and run with
//! `RUST_LOG=quadtree_reduce=debug`.

use clap::Parser;
use glam::UVec2;
use quadtree_reduce::{CellAddress, ExecutionContext, ReduceConfig, Reducer};
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Parser)]
#[command(name = "bench_reduce")]
#[command(about = "Benchmark sort/dedup/decay compaction plus rule flattening")]
struct Args {
    /// Pair counts to benchmark (e.g., 100k, 1m).
    #[arg(value_parser = parse_count, default_values_t = vec![100_000usize])]
    sizes: Vec<usize>,

    /// Random seed.
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Iterations per size.
    #[arg(short = 'n', long, default_value_t = 3)]
    repeat: usize,

    /// Worker threads for a dedicated pool (default: global pool).
    #[arg(long)]
    units: Option<usize>,

    /// Fraction of pairs emitted twice.
    #[arg(long, default_value_t = 0.25)]
    dup_rate: f64,

    /// Build a single chain instead of a random forest.
    #[arg(long)]
    chain: bool,
}

/// Deepest level whose side fits `n` distinct cells.
fn depth_for(n: usize) -> u32 {
    let mut depth = 1;
    while (1usize << (2 * depth)) < n && depth < quadtree_reduce::MAX_DEPTH {
        depth += 1;
    }
    depth
}

fn address_of(id: usize, depth: u32) -> u64 {
    let side = 1usize << depth;
    let xy = UVec2::new((id % side) as u32, ((id / side) % side) as u32);
    CellAddress::from_xy(depth, xy)
        .map(CellAddress::raw)
        .unwrap_or(id as u64)
}

/// Random relation of roughly `n` pairs; every node points at a smaller id.
fn generate(n: usize, chain: bool, dup_rate: f64, rng: &mut ChaCha8Rng) -> (Vec<u64>, Vec<u64>) {
    let nodes = n + 1;
    let depth = depth_for(nodes);
    let mut pairs = Vec::with_capacity(n + (n as f64 * dup_rate) as usize);
    for id in 1..nodes {
        let parent = if chain { id - 1 } else { rng.gen_range(0..id) };
        let pair = (address_of(id, depth), address_of(parent, depth));
        pairs.push(pair);
        if rng.gen_bool(dup_rate.clamp(0.0, 1.0)) {
            pairs.push(pair);
        }
    }
    pairs.shuffle(rng);
    pairs.into_iter().unzip()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let ctx = match args.units {
        Some(units) => match ExecutionContext::with_units(units) {
            Ok(ctx) => ctx,
            Err(e) => {
                eprintln!("failed to create execution context: {e}");
                std::process::exit(1);
            }
        },
        None => ExecutionContext::global(),
    };
    let reducer = Reducer::new(&ctx, ReduceConfig::from_env());

    println!(
        "units={} repeat={} dup_rate={:.2} shape={}",
        ctx.compute_units(),
        args.repeat,
        args.dup_rate,
        if args.chain { "chain" } else { "forest" }
    );
    println!(
        "{:>10} {:>10} {:>8} {:>8} {:>12} {:>12}",
        "Pairs", "Live", "Compact", "Flatten", "Mean (ms)", "Min (ms)"
    );
    println!("{}", "-".repeat(66));

    for &n in &args.sizes {
        let (from, to) = generate(n, args.chain, args.dup_rate, &mut rng);
        let mut times = Vec::with_capacity(args.repeat);
        let mut last = None;

        for _ in 0..args.repeat.max(1) {
            let (mut f, mut t) = (from.clone(), to.clone());
            let start = Instant::now();
            let result = reducer.reduce(&mut f, &mut t);
            times.push(start.elapsed().as_secs_f64() * 1000.0);
            match result {
                Ok(out) => last = Some(out),
                Err(e) => {
                    eprintln!("reduction of {} pairs failed: {e}", from.len());
                    std::process::exit(1);
                }
            }
        }

        let mean = times.iter().sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        if let Some(out) = last {
            println!(
                "{:>10} {:>10} {:>8} {:>8} {:>12.2} {:>12.2}",
                from.len(),
                out.live,
                out.stats.compact_iterations,
                out.stats.flatten_passes,
                mean,
                min
            );
        }
    }
}
