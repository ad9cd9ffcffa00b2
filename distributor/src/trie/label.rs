// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The behaviour-labelling pass: walk every input key through the
//! finalized trie, emitting the (node, path) -> behaviour records that
//! become the hollow trie's two MWHC functions.

use super::{Behaviour, FinalizedTrie};
use mmph_bitvec::BitVector;

/// Raw (node index, consumed path bits, behaviour) emissions collected
/// across every key in the input, split by whether the emitting node is
/// internal or a leaf.
pub struct LabelPass {
	pub internal_records: Vec<(u64, BitVector, Behaviour)>,
	pub external_records: Vec<(u64, BitVector, Behaviour)>,
}

/// Walks every key in `keys` through `trie`, producing the internal and
/// external key streams. `trie` must be the trie built from the delimiters
/// extracted from the same sorted key sequence.
pub fn label_keys(trie: &FinalizedTrie, keys: &[BitVector]) -> LabelPass {
	let mut internal_records = Vec::new();
	let mut external_records = Vec::new();

	let Some(root) = trie.root() else {
		return LabelPass { internal_records, external_records };
	};

	// An internal node's FOLLOW behaviour is identical for every key that
	// passes through it, so it is recorded only the first time any key
	// reaches a full match there (the open question in the design notes
	// resolves this as the only cross-key deduplication that applies;
	// everything else is naturally emitted at most once per key, since a
	// key's walk ends at its first non-FOLLOW node).
	let mut follow_emitted = vec![false; trie.nodes.len()];

	for key in keys {
		let mut node_idx = root;
		let mut pos = 0usize;

		loop {
			let node = &trie.nodes[node_idx];
			let path = &node.path;
			let key_suffix = key.sub_vector(pos, key.len());
			let c = key_suffix.longest_common_prefix(path);
			let is_leaf = trie.is_leaf(node_idx);

			if c == path.len() {
				if is_leaf {
					let consumed = key.sub_vector(pos, key.len());
					external_records.push((node_idx as u64, consumed, Behaviour::Left));
					break;
				}
				if !follow_emitted[node_idx] {
					internal_records.push((node_idx as u64, path.clone(), Behaviour::Follow));
					follow_emitted[node_idx] = true;
				}
				pos += path.len();
				debug_assert!(pos < key.len(), "key exhausted exactly at an internal node boundary, violating prefix-freedom");
				if pos >= key.len() {
					break;
				}
				let bit = key.get(pos);
				pos += 1;
				node_idx = if bit { node.right.unwrap() } else { node.left.unwrap() };
				continue;
			}

			let behaviour = if path.get(c) { Behaviour::Left } else { Behaviour::Right };
			if is_leaf {
				let consumed = key.sub_vector(pos, key.len());
				external_records.push((node_idx as u64, consumed, behaviour));
			} else {
				let avail = key.len() - pos;
				let path_len = path.len().min(avail);
				let consumed = key.sub_vector(pos, pos + path_len);
				internal_records.push((node_idx as u64, consumed, behaviour));
			}
			break;
		}
	}

	LabelPass { internal_records, external_records }
}
