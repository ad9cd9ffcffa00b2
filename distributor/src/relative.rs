// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The relative-trie distributor: instead of storing the trie's topology
//! directly, it keeps a signature table over internal-node representations
//! (an approximate "have I seen this prefix before" probe), a per-key exit
//! direction function, and a monotone ranker over a small derived alphabet
//! of "ranker strings". A construction-time mistake table corrects every
//! case where the probe's answer disagrees with the trie's own ground
//! truth.
//!
//! `length(v)`, the depth this module resolves for a query `v`, is always
//! the representation length of the *deepest internal node fully matched*
//! along `v`'s walk (including a virtual root ancestor of length 0, for
//! tries whose root itself carries a non-empty compacted path) — never an
//! arbitrary mid-path divergence depth. That is what keeps the three
//! ranker-string transforms (identical at construction and query time)
//! landing on the same derived alphabet either way.

use crate::error::BuildError;
use crate::trie::{Behaviour, FinalizedTrie};
use mmph_bitvec::BitVector;
use mmph_succinct::{hash, Mwhc, Rank9};
use std::collections::{HashSet};

const SIGNATURE_SEED: u64 = 0x5245_4c41_5449_5645;
const MISTAKE_SEED: u64 = 0x4d49_5354_414b_4521;
const SMALL_RANKER_THRESHOLD: usize = 64;

enum Ranker {
	Small(Vec<BitVector>),
	Mwhc(Mwhc),
}

impl Ranker {
	fn rank(&self, r: &BitVector) -> u64 {
		match self {
			Ranker::Small(sorted) => {
				sorted.binary_search(r).map(|i| i as u64).unwrap_or_else(|i| i as u64)
			}
			Ranker::Mwhc(f) => f.get(r),
		}
	}

	fn num_bits(&self) -> u64 {
		match self {
			Ranker::Small(v) => v.iter().map(BitVector::num_bits).sum::<u64>() + 64,
			Ranker::Mwhc(f) => f.num_bits(),
		}
	}
}

/// A monotone minimal perfect hash distributor backed by signature probes,
/// a ranker over derived boundary strings, and a mistake-correction table.
pub struct RelativeTrieDistributor {
	signature: Mwhc,
	distinct_lengths: Vec<u32>,
	behaviour_fn: Mwhc,
	ranker: Ranker,
	leaves: Rank9,
	mistake_set: Vec<u32>,
	corrections: Mwhc,
	num_delimiters: u64,
}

/// Walks `key` through `trie`, returning `(length, behaviour)`:
/// `length` is the representation length of the deepest internal node
/// fully matched before `key` diverges (0 if none, covering a root whose
/// own path is only partially matched); `behaviour` is `key`'s true exit
/// direction.
fn relative_walk(trie: &FinalizedTrie, node_repr: &[BitVector], key: &BitVector) -> (usize, Behaviour) {
	let Some(root) = trie.root() else {
		return (0, Behaviour::Left);
	};
	let mut node_idx = root;
	let mut pos = 0usize;
	let mut last_confirmed_length = 0usize;

	loop {
		let node = &trie.nodes[node_idx];
		let path = &node.path;
		let key_suffix = key.sub_vector(pos, key.len());
		let c = key_suffix.longest_common_prefix(path);
		let is_leaf = trie.is_leaf(node_idx);

		if c == path.len() {
			if is_leaf {
				return (last_confirmed_length, Behaviour::Left);
			}
			last_confirmed_length = node_repr[node_idx].len();
			pos += path.len();
			let bit = key.get(pos);
			pos += 1;
			node_idx = if bit { node.right.unwrap() } else { node.left.unwrap() };
			continue;
		}

		let behaviour = if path.get(c) { Behaviour::Left } else { Behaviour::Right };
		return (last_confirmed_length, behaviour);
	}
}

fn truncate_to_last_one_inclusive(v: &BitVector) -> Option<BitVector> {
	(0..v.len()).rev().find(|&j| v.get(j)).map(|j| v.sub_vector(0, j + 1))
}

fn truncate_to_last_zero_flip(v: &BitVector) -> Option<BitVector> {
	(0..v.len()).rev().find(|&j| !v.get(j)).map(|j| {
		let mut r = v.sub_vector(0, j);
		r.push(true);
		r
	})
}

fn append_one(v: &BitVector) -> BitVector {
	let mut r = v.clone();
	r.push(true);
	r
}

fn build_ranker_key(prefix: &BitVector, bit: bool, behaviour: Behaviour) -> Option<BitVector> {
	match (behaviour, bit) {
		(Behaviour::Left, true) => Some(append_one(prefix)),
		(Behaviour::Left, false) => truncate_to_last_one_inclusive(prefix),
		(Behaviour::Right, true) => truncate_to_last_zero_flip(prefix),
		(Behaviour::Right, false) => Some(append_one(prefix)),
		(Behaviour::Follow, _) => unreachable!("the exit-direction function only ever yields Left or Right"),
	}
}

fn node_string_length(signature: &Mwhc, distinct_lengths: &[u32], v: &BitVector) -> usize {
	for &len in distinct_lengths {
		let len = len as usize;
		if len <= v.len() && signature.get(&v.sub_vector(0, len)) == 1 {
			return len;
		}
	}
	0
}

impl RelativeTrieDistributor {
	pub fn build(trie: &FinalizedTrie, delimiters: &[BitVector], keys: &[BitVector], mwhc_retry_budget: u64) -> Result<Self, BuildError> {
		let n = trie.nodes.len();
		let num_delimiters = trie.root().map(|r| trie.subtree_leaf_count[r]).unwrap_or(0);

		if n == 0 {
			return Ok(RelativeTrieDistributor {
				signature: Mwhc::build_with_budget(&[], &[], 1, mwhc_retry_budget)?,
				distinct_lengths: Vec::new(),
				behaviour_fn: Mwhc::build_with_budget(&[], &[], 1, mwhc_retry_budget)?,
				ranker: Ranker::Small(Vec::new()),
				leaves: Rank9::new(&BitVector::new()),
				mistake_set: Vec::new(),
				corrections: Mwhc::build_with_budget(&[], &[], 1, mwhc_retry_budget)?,
				num_delimiters: 0,
			});
		}

		// Absolute (root-to-node) representation of every node.
		let mut node_repr: Vec<BitVector> = vec![BitVector::new(); n];
		node_repr[0] = trie.nodes[0].path.clone();
		for i in 0..n {
			if let (Some(l), Some(r)) = (trie.nodes[i].left, trie.nodes[i].right) {
				let mut left_repr = node_repr[i].clone();
				left_repr.push(false);
				left_repr.append(&trie.nodes[l].path);
				node_repr[l] = left_repr;
				let mut right_repr = node_repr[i].clone();
				right_repr.push(true);
				right_repr.append(&trie.nodes[r].path);
				node_repr[r] = right_repr;
			}
		}

		// The virtual length-0 ancestor covers a root whose own path hasn't
		// been fully matched yet.
		let mut internal_reprs: Vec<BitVector> = vec![BitVector::new()];
		for i in 0..n {
			if !trie.is_leaf(i) {
				internal_reprs.push(node_repr[i].clone());
			}
		}
		internal_reprs.sort();
		internal_reprs.dedup();

		let mut distinct_lengths: Vec<u32> = internal_reprs.iter().map(|v| v.len() as u32).collect();
		distinct_lengths.sort_unstable();
		distinct_lengths.dedup();
		distinct_lengths.reverse();

		let sig_vals = vec![1u64; internal_reprs.len()];
		let signature = Mwhc::build_with_budget(&internal_reprs, &sig_vals, 1, mwhc_retry_budget)?;

		let mut ranker_set: HashSet<BitVector> = HashSet::new();
		for v in &internal_reprs {
			if let Some(r) = truncate_to_last_one_inclusive(v) {
				ranker_set.insert(r);
			}
			ranker_set.insert(append_one(v));
			if let Some(r) = truncate_to_last_zero_flip(v) {
				ranker_set.insert(r);
			}
		}
		let mut ranker_strings: Vec<BitVector> = ranker_set.into_iter().collect();
		ranker_strings.sort();

		let delimiter_set: HashSet<&BitVector> = delimiters.iter().collect();
		let mut leaves_bits = BitVector::with_bit_capacity(ranker_strings.len());
		for r in &ranker_strings {
			leaves_bits.push(delimiter_set.contains(r));
		}
		let leaves = Rank9::new(&leaves_bits);

		let ranker = if ranker_strings.len() < SMALL_RANKER_THRESHOLD {
			Ranker::Small(ranker_strings.clone())
		} else {
			let ranker_vals: Vec<u64> = (0..ranker_strings.len() as u64).collect();
			let width = (64 - (ranker_strings.len() as u64).leading_zeros()).max(1);
			Ranker::Mwhc(Mwhc::build_with_budget(&ranker_strings, &ranker_vals, width, mwhc_retry_budget)?)
		};

		let mut b_vals = Vec::with_capacity(keys.len());
		let mut true_lengths = Vec::with_capacity(keys.len());
		for k in keys {
			let (len, beh) = relative_walk(trie, &node_repr, k);
			b_vals.push(beh as u64);
			true_lengths.push(len as u32);
		}
		let behaviour_fn = Mwhc::build_with_budget(keys, &b_vals, 1, mwhc_retry_budget)?;

		let max_len = true_lengths.iter().copied().max().unwrap_or(0);
		let len_width = if max_len == 0 { 1 } else { 32 - max_len.leading_zeros() };

		let mut mistake_sig_set: HashSet<u32> = HashSet::new();
		for (k, &true_len) in keys.iter().zip(&true_lengths) {
			let approx_len = node_string_length(&signature, &distinct_lengths, k);
			if approx_len != true_len as usize {
				mistake_sig_set.insert(hash::signature32(k, MISTAKE_SEED));
			}
		}

		let mut correction_keys = Vec::new();
		let mut correction_vals = Vec::new();
		for (k, &true_len) in keys.iter().zip(&true_lengths) {
			if mistake_sig_set.contains(&hash::signature32(k, MISTAKE_SEED)) {
				correction_keys.push(k.clone());
				correction_vals.push(true_len as u64);
			}
		}
		let corrections = Mwhc::build_with_budget(&correction_keys, &correction_vals, len_width, mwhc_retry_budget)?;
		let mut mistake_set: Vec<u32> = mistake_sig_set.into_iter().collect();
		mistake_set.sort_unstable();

		log::debug!(
			"relative trie: {} ranker strings, {} mistake signatures, {} corrections",
			ranker_strings.len(),
			mistake_set.len(),
			correction_keys.len()
		);

		Ok(RelativeTrieDistributor {
			signature,
			distinct_lengths,
			behaviour_fn,
			ranker,
			leaves,
			mistake_set,
			corrections,
			num_delimiters,
		})
	}

	/// Returns the bucket index for `v`. Undefined (but panic-free for any
	/// in-range query) if `v` was not part of the construction set.
	pub fn get_long(&self, v: &BitVector) -> u64 {
		if self.num_delimiters == 0 && self.distinct_lengths.is_empty() {
			return 0;
		}
		let mut length = node_string_length(&self.signature, &self.distinct_lengths, v);
		let sig32 = hash::signature32(v, MISTAKE_SEED);
		if self.mistake_set.binary_search(&sig32).is_ok() {
			length = self.corrections.get(v) as usize;
		}
		let bit = length < v.len() && v.get(length);
		let behaviour = Behaviour::from_u64(self.behaviour_fn.get(v));
		let prefix = v.sub_vector(0, length.min(v.len()));
		match build_ranker_key(&prefix, bit, behaviour) {
			Some(r) => self.leaves.rank(self.ranker.rank(&r) as usize),
			None => self.num_delimiters,
		}
	}

	pub fn num_bits(&self) -> u64 {
		if self.num_delimiters == 0 && self.distinct_lengths.is_empty() {
			return 0;
		}
		self.signature.num_bits()
			+ self.behaviour_fn.num_bits()
			+ self.ranker.num_bits()
			+ self.leaves.num_bits()
			+ self.corrections.num_bits()
			+ (self.mistake_set.len() as u64) * 32
	}
}
