// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The hollow-trie distributor: the trie's topology (one bit per node) plus
//! per-internal-node path lengths, with the path *content* discarded and
//! recovered only through two MWHC behaviour functions.
//!
//! The published query algorithm for this structure (Sux4j's
//! `HollowTrieDistributor`) tracks a BFS "level window" and reuses it to
//! accumulate the number of leaves passed so far via live rank queries — a
//! neat constant-factor trick, but one that is orthogonal to the
//! structure's correctness contract. This implementation gets the same
//! answer a more straightforward way: at construction time, while the full
//! (non-hollow) trie is still in memory, it computes for every node the
//! number of delimiter leaves strictly to its left in true lexicographic
//! order (`leaves_before`) and the number of leaves in its own subtree
//! (`subtree_leaf_count`), and stores both alongside the hollow topology.
//! Query then needs only the behaviour functions to decide *which* node it
//! exits at, not to re-derive a leaf count along the way.

use crate::error::BuildError;
use crate::spill::spill_and_reload;
use crate::trie::label::LabelPass;
use crate::trie::{dedup_records, encode_mwhc_key, Behaviour, FinalizedTrie};
use mmph_bitvec::BitVector;
use mmph_succinct::{EliasFanoMonotoneList, Mwhc, PackedInts, Rank9, SimpleSelect};
use std::path::Path;

/// A monotone minimal perfect hash distributor backed by a hollow compacted
/// trie and two MWHC behaviour functions.
pub struct HollowTrieDistributor {
	h_rank: Rank9,
	#[allow(dead_code)]
	h_select: SimpleSelect,
	sigma_cumsum: EliasFanoMonotoneList,
	leaves_before: PackedInts,
	subtree_leaf_count: PackedInts,
	f_int: Mwhc,
	f_ext: Mwhc,
	num_nodes: usize,
}

impl HollowTrieDistributor {
	pub fn build(trie: &FinalizedTrie, label: LabelPass, temp_dir: Option<&Path>, mwhc_retry_budget: u64) -> Result<Self, BuildError> {
		let n = trie.nodes.len();

		// Round-trip both record streams through a temporary file before
		// deduplicating, bounding peak in-memory state during this pass to
		// the size of one stream at a time rather than both plus their
		// dedup maps simultaneously.
		let internal_records = spill_and_reload(label.internal_records, temp_dir)?;
		let external_records = spill_and_reload(label.external_records, temp_dir)?;
		let (int_keys, int_vals) = dedup_records(internal_records);
		let (ext_keys, ext_vals) = dedup_records(external_records);
		let f_int = Mwhc::build_with_budget(&int_keys, &int_vals, 2, mwhc_retry_budget)?;
		let f_ext = Mwhc::build_with_budget(&ext_keys, &ext_vals, 1, mwhc_retry_budget)?;

		if n == 0 {
			return Ok(HollowTrieDistributor {
				h_rank: Rank9::new(&BitVector::new()),
				h_select: SimpleSelect::new(&BitVector::new()),
				sigma_cumsum: EliasFanoMonotoneList::new(&[]),
				leaves_before: PackedInts::new(0, 0),
				subtree_leaf_count: PackedInts::new(0, 0),
				f_int,
				f_ext,
				num_nodes: 0,
			});
		}

		let mut h_bits = BitVector::with_bit_capacity(n);
		let mut skip_lengths = Vec::new();
		for node in &trie.nodes {
			let is_internal = node.left.is_some();
			h_bits.push(is_internal);
			if is_internal {
				skip_lengths.push(node.path.len() as u64);
			}
		}

		let mut cumsum = Vec::with_capacity(skip_lengths.len() + 1);
		cumsum.push(0u64);
		let mut acc = 0u64;
		for &s in &skip_lengths {
			acc += s;
			cumsum.push(acc);
		}

		let max_subtree = trie.subtree_leaf_count.iter().copied().max().unwrap_or(0);
		let width = if max_subtree == 0 { 0 } else { 64 - max_subtree.leading_zeros() };
		let mut subtree_packed = PackedInts::new(width, n);
		for (i, &v) in trie.subtree_leaf_count.iter().enumerate() {
			subtree_packed.set(i, v);
		}

		// `leaves_before` is indexed in BFS order, which is not the
		// lexicographic left-right order the sequence would need to be
		// non-decreasing in — a right-subtree node can sit at a lower BFS
		// index than a deeper left-subtree node with a larger leaf count.
		// Store it as a plain packed array rather than Elias-Fano, which
		// requires monotone input.
		let max_leaves_before = trie.leaves_before.iter().copied().max().unwrap_or(0);
		let leaves_before_width = if max_leaves_before == 0 { 0 } else { 64 - max_leaves_before.leading_zeros() };
		let mut leaves_before_packed = PackedInts::new(leaves_before_width, n);
		for (i, &v) in trie.leaves_before.iter().enumerate() {
			leaves_before_packed.set(i, v);
		}

		log::debug!("hollow trie: {n} nodes, {} internal keys, {} external keys", int_keys.len(), ext_keys.len());

		Ok(HollowTrieDistributor {
			h_rank: Rank9::new(&h_bits),
			h_select: SimpleSelect::new(&h_bits),
			sigma_cumsum: EliasFanoMonotoneList::new(&cumsum),
			leaves_before: leaves_before_packed,
			subtree_leaf_count: subtree_packed,
			f_int,
			f_ext,
			num_nodes: n,
		})
	}

	fn sigma(&self, r: usize) -> u64 {
		self.sigma_cumsum.get(r + 1) - self.sigma_cumsum.get(r)
	}

	/// Returns the bucket index for `q`. Undefined (but panic-free for any
	/// in-range query) if `q` was not part of the construction set.
	pub fn query(&self, q: &BitVector) -> u64 {
		if self.num_nodes == 0 {
			return 0;
		}
		let mut p = 0usize;
		let mut r = 0usize;
		let mut s = 0usize;

		loop {
			let is_internal = self.h_rank.get(p);
			let skip = if is_internal { self.sigma(r) } else { 0 };
			let path_bits = if is_internal {
				let end = (s + skip as usize).min(q.len());
				q.sub_vector(s, end)
			} else {
				q.sub_vector(s, q.len())
			};
			let key = encode_mwhc_key(p as u64, &path_bits);
			let behaviour = if is_internal { Behaviour::from_u64(self.f_int.get(&key)) } else { Behaviour::from_u64(self.f_ext.get(&key)) };
			let exhausted = s + skip as usize >= q.len();

			if behaviour != Behaviour::Follow || !is_internal || exhausted {
				return match behaviour {
					Behaviour::Right => self.leaves_before.get(p) + self.subtree_leaf_count.get(p),
					_ => self.leaves_before.get(p),
				};
			}

			s += skip as usize;
			let bit = q.get(s);
			p = if bit { 2 * r + 2 } else { 2 * r + 1 };
			r = self.h_rank.rank(p) as usize;
			s += 1;
		}
	}

	pub fn size(&self) -> usize {
		self.num_nodes
	}

	pub fn num_bits(&self) -> u64 {
		if self.num_nodes == 0 {
			return 0;
		}
		self.h_rank.num_bits()
			+ self.sigma_cumsum.num_bits()
			+ self.leaves_before.num_bits()
			+ self.subtree_leaf_count.num_bits()
			+ self.f_int.num_bits()
			+ self.f_ext.num_bits()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::trie::builder::TrieBuilder;
	use crate::trie::label::label_keys;

	fn bits(s: &str) -> BitVector {
		BitVector::from_bits(&s.chars().map(|c| c == '1').collect::<Vec<_>>())
	}

	fn build_for(keys: &[BitVector], bucket_size: usize) -> HollowTrieDistributor {
		let mut builder = TrieBuilder::new();
		for (i, k) in keys.iter().enumerate() {
			if (i + 1) % bucket_size == 0 {
				builder.insert(k);
			}
		}
		let trie = builder.finalize();
		let label = label_keys(&trie, keys);
		HollowTrieDistributor::build(&trie, label, None, 100).unwrap()
	}

	#[test]
	fn scenario_a_matches_expected_buckets() {
		let keys = vec![bits("0001"), bits("0010"), bits("0100"), bits("1000")];
		let d = build_for(&keys, 2);
		let expected = [0u64, 0, 1, 1];
		for (k, &e) in keys.iter().zip(&expected) {
			assert_eq!(d.query(k), e);
		}
	}

	#[test]
	fn empty_input_has_zero_size_and_always_queries_zero() {
		let trie = TrieBuilder::new().finalize();
		let label = label_keys(&trie, &[]);
		let d = HollowTrieDistributor::build(&trie, label, None, 100).unwrap();
		assert_eq!(d.size(), 0);
		assert_eq!(d.num_bits(), 0);
		assert_eq!(d.query(&bits("101")), 0);
	}

	#[test]
	fn sixty_four_six_bit_keys_bucket_by_eight() {
		let keys: Vec<BitVector> = (0u32..64)
			.map(|i| {
				let mut s = format!("{:06b}", i);
				s.push('1');
				bits(&s)
			})
			.collect();
		let d = build_for(&keys, 8);
		for (i, k) in keys.iter().enumerate() {
			assert_eq!(d.query(k), (i / 8) as u64, "key {i}");
		}
	}
}
