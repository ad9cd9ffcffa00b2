// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Minimal-perfect-hash-style static function (MWHC): given a fixed set of
//! `M` keys and a value of `width` bits per key, returns the stored value
//! for any key in the set in O(1) probes, using roughly `1.23 * M * width`
//! bits. Behaviour on keys outside the construction set is undefined.
//!
//! Construction follows the classic three-hypergraph peeling technique
//! (Majewski, Wormald, Havas and Czech): each key is hashed to three table
//! slots drawn from three disjoint segments (guaranteeing the three slots
//! of one key are always distinct); a peelable hypergraph is found by
//! retrying with new seeds, and values are assigned to vertices by
//! back-substitution in the reverse order in which edges were peeled.

use crate::hash::jenkins_triple;
use crate::packed::PackedInts;
use mmph_bitvec::BitVector;
use std::collections::VecDeque;

/// Load factor for the hypergraph table relative to the number of keys;
/// matches the standard MWHC construction's ~1.23 space overhead.
const GAMMA: f64 = 1.23;

/// Default bounded number of seed retries before giving up on finding a
/// peelable hypergraph, used by [`Mwhc::build`]. Each attempt has an
/// overwhelming chance of success once the table is sized at `GAMMA`, so in
/// practice this bound is never hit. Callers that want a different budget
/// (e.g. from [`crate`]'s configuration) use [`Mwhc::build_with_budget`].
const DEFAULT_MAX_SEED_ATTEMPTS: u64 = 100;

#[derive(Debug)]
pub struct MwhcConstructionError {
	attempted: u64,
}

impl std::fmt::Display for MwhcConstructionError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "failed to find a peelable MWHC hypergraph within {} seed attempts", self.attempted)
	}
}
impl std::error::Error for MwhcConstructionError {}

/// A static function from a fixed key set to fixed-width values.
#[derive(Clone, Debug)]
pub struct Mwhc {
	seed: u64,
	segment_size: usize,
	values: PackedInts,
	width: u32,
	num_keys: usize,
}

impl Mwhc {
	/// Builds a function mapping `keys[i]` to `values[i]` for every `i`,
	/// where each value fits in `width` bits (`width <= 64`), retrying up to
	/// [`DEFAULT_MAX_SEED_ATTEMPTS`] times.
	///
	/// # Panics
	/// Panics if `keys.len() != values.len()`.
	pub fn build(keys: &[BitVector], values: &[u64], width: u32) -> Result<Self, MwhcConstructionError> {
		Self::build_with_budget(keys, values, width, DEFAULT_MAX_SEED_ATTEMPTS)
	}

	/// Same as [`Mwhc::build`], but with an explicit retry budget in place of
	/// [`DEFAULT_MAX_SEED_ATTEMPTS`] — callers with their own configured
	/// budget (e.g. `BuilderConfig::mwhc_retry_budget`) use this directly.
	///
	/// # Panics
	/// Panics if `keys.len() != values.len()`.
	pub fn build_with_budget(keys: &[BitVector], values: &[u64], width: u32, max_attempts: u64) -> Result<Self, MwhcConstructionError> {
		assert_eq!(keys.len(), values.len());
		let n = keys.len();
		if n == 0 {
			return Ok(Mwhc { seed: 0, segment_size: 0, values: PackedInts::new(width, 0), width, num_keys: 0 });
		}

		let segment_size = ((GAMMA * n as f64 / 3.0).ceil() as usize).max(1);
		for attempt in 0..max_attempts {
			let seed = attempt.wrapping_mul(0x9e3779b97f4a7c15).wrapping_add(1);
			if let Some(packed) = try_build(keys, values, width, segment_size, seed) {
				log::debug!("mwhc: built function for {n} keys after {} seed attempt(s)", attempt + 1);
				return Ok(Mwhc { seed, segment_size, values: packed, width, num_keys: n });
			}
			log::warn!("mwhc: hypergraph not peelable with seed {seed}, retrying");
		}
		Err(MwhcConstructionError { attempted: max_attempts })
	}

	/// Looks up the value stored for `key`. Undefined (but panic-free)
	/// result if `key` was not part of the construction set.
	pub fn get(&self, key: &BitVector) -> u64 {
		if self.num_keys == 0 {
			return 0;
		}
		let edge = self.edge_for(key);
		(self.values.get(edge[0]) ^ self.values.get(edge[1]) ^ self.values.get(edge[2])) & mask(self.width)
	}

	fn edge_for(&self, key: &BitVector) -> [usize; 3] {
		edge_from_hash(jenkins_triple(key.words(), key.len() as u64, self.seed), self.segment_size)
	}

	pub fn num_bits(&self) -> u64 {
		self.values.num_bits() + 128 // seed + segment_size bookkeeping, order of a couple words
	}
}

#[inline]
fn mask(width: u32) -> u64 {
	if width >= 64 {
		u64::MAX
	} else {
		(1u64 << width) - 1
	}
}

fn edge_from_hash(h: [u64; 3], segment_size: usize) -> [usize; 3] {
	let s = segment_size as u64;
	[
		(h[0] % s) as usize,
		segment_size + (h[1] % s) as usize,
		2 * segment_size + (h[2] % s) as usize,
	]
}

struct PeelStep {
	edge: usize,
	pivot: usize,
}

fn try_build(keys: &[BitVector], values: &[u64], width: u32, segment_size: usize, seed: u64) -> Option<PackedInts> {
	let n = keys.len();
	let num_vertices = 3 * segment_size;

	let edges: Vec<[usize; 3]> =
		keys.iter().map(|k| edge_from_hash(jenkins_triple(k.words(), k.len() as u64, seed), segment_size)).collect();

	let mut incident: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];
	for (edge_idx, edge) in edges.iter().enumerate() {
		for &v in edge {
			incident[v].push(edge_idx);
		}
	}

	let mut degree: Vec<usize> = incident.iter().map(|v| v.len()).collect();
	let mut edge_active = vec![true; n];
	let mut queue: VecDeque<usize> = (0..num_vertices).filter(|&v| degree[v] == 1).collect();
	let mut peel_order = Vec::with_capacity(n);

	while let Some(v) = queue.pop_front() {
		if degree[v] != 1 {
			continue;
		}
		let Some(&edge_idx) = incident[v].iter().find(|&&e| edge_active[e]) else {
			continue;
		};
		edge_active[edge_idx] = false;
		peel_order.push(PeelStep { edge: edge_idx, pivot: v });
		for &u in &edges[edge_idx] {
			if u != v {
				degree[u] -= 1;
				if degree[u] == 1 {
					queue.push_back(u);
				}
			}
		}
		degree[v] = 0;
	}

	if peel_order.len() != n {
		return None;
	}

	let mut assigned = vec![0u64; num_vertices];
	for step in peel_order.iter().rev() {
		let edge = &edges[step.edge];
		let other_xor = edge.iter().filter(|&&v| v != step.pivot).fold(0u64, |acc, &v| acc ^ assigned[v]);
		assigned[step.pivot] = (values[step.edge] ^ other_xor) & mask(width);
	}

	let mut packed = PackedInts::new(width, num_vertices);
	for (v, val) in assigned.into_iter().enumerate() {
		packed.set(v, val);
	}
	Some(packed)
}
