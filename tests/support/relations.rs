#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use glam::UVec2;
use quadtree_reduce::CellAddress;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Depth used when turning node ids into cell addresses.
const ID_DEPTH: u32 = 12;

/// Map a node id to a distinct cell address at a fixed depth.
///
/// Address order differs from id order, so acyclicity by id says nothing
/// about the order the reducer sees keys in.
pub fn address_of(id: u32) -> u64 {
    let side = 1u32 << ID_DEPTH;
    let xy = UVec2::new(id % side, (id / side) % side);
    CellAddress::from_xy(ID_DEPTH, xy)
        .expect("id fits the address depth")
        .raw()
}

/// Random acyclic functional relation: every key has exactly one target.
///
/// Nodes `1..num_nodes` get a parent with a smaller id with probability
/// `link_prob`. Each pair is repeated `0..=max_repeats` extra times and the
/// result is shuffled.
pub fn random_forest(
    num_nodes: u32,
    link_prob: f64,
    max_repeats: usize,
    seed: u64,
) -> (Vec<u64>, Vec<u64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pairs = Vec::new();
    for id in 1..num_nodes {
        if !rng.gen_bool(link_prob) {
            continue;
        }
        let parent = rng.gen_range(0..id);
        let copies = 1 + rng.gen_range(0..=max_repeats);
        for _ in 0..copies {
            pairs.push((address_of(id), address_of(parent)));
        }
    }
    pairs.shuffle(&mut rng);
    pairs.into_iter().unzip()
}

/// Chain `len -> len-1 -> ... -> 0` in shuffled order.
pub fn chain(len: u32, seed: u64) -> (Vec<u64>, Vec<u64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pairs: Vec<(u64, u64)> = (1..=len)
        .map(|id| (address_of(id), address_of(id - 1)))
        .collect();
    pairs.shuffle(&mut rng);
    pairs.into_iter().unzip()
}

/// Shuffle a relation's pair order.
pub fn shuffled(from: &[u64], to: &[u64], seed: u64) -> (Vec<u64>, Vec<u64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pairs: Vec<(u64, u64)> = from.iter().copied().zip(to.iter().copied()).collect();
    pairs.shuffle(&mut rng);
    pairs.into_iter().unzip()
}

/// Terminal representative of every key of a functional acyclic relation,
/// computed by following targets one hop at a time.
pub fn resolve_reference(from: &[u64], to: &[u64]) -> BTreeMap<u64, u64> {
    let edges: HashMap<u64, u64> = from.iter().copied().zip(to.iter().copied()).collect();
    edges
        .keys()
        .map(|&k| {
            let mut v = edges[&k];
            while let Some(&next) = edges.get(&v) {
                if next == v {
                    break;
                }
                v = next;
            }
            (k, v)
        })
        .collect()
}

/// Live pairs as a sorted map.
pub fn as_map(from: &[u64], to: &[u64], live: usize) -> BTreeMap<u64, u64> {
    from[..live]
        .iter()
        .copied()
        .zip(to[..live].iter().copied())
        .collect()
}
