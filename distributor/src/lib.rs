// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Monotone minimal perfect hash (MMPH) distributors built on compacted
//! binary tries over prefix-free bit-string keys.
//!
//! A distributor takes a sorted set of distinct, prefix-free bit vectors,
//! partitions it into fixed-size buckets, and builds a structure that maps
//! any member key back to its bucket index in O(key length) time, using
//! space sublinear in the total key length. Two variants are available —
//! [`Distributor::build_hollow`] keeps an explicit (if hollowed-out) trie;
//! [`Distributor::build_relative`] replaces it with signatures and a
//! mistake-corrected ranker — see `hollow` and `relative` for the tradeoff.

pub mod config;
pub mod error;
pub mod hollow;
pub mod relative;
mod spill;
pub mod transform;
pub(crate) mod trie;

pub use config::BuilderConfig;
pub use error::{BuildError, InvalidInputKind};
pub use hollow::HollowTrieDistributor;
pub use relative::RelativeTrieDistributor;
pub use transform::{FixedLengthStrategy, LengthPrefixedStrategy, NulTerminatedStrategy, TransformationStrategy};

use mmph_bitvec::BitVector;
use trie::builder::TrieBuilder;
use trie::label::label_keys;

/// Either concrete distributor variant, behind one query surface.
pub enum Distributor {
	Hollow(HollowTrieDistributor),
	Relative(RelativeTrieDistributor),
}

impl Distributor {
	/// Builds a hollow-trie distributor from elements transformed by
	/// `strategy`, bucketed per `config.bucket_size`.
	///
	/// `elements` must transform, in iteration order, to a strictly
	/// increasing, prefix-free, duplicate-free sequence of bit vectors —
	/// the caller is responsible for presenting them pre-sorted, since
	/// sorting is an orthogonal concern this crate does not perform.
	pub fn build_hollow<E: ?Sized>(
		elements: &[&E],
		strategy: &dyn TransformationStrategy<E>,
		config: &BuilderConfig,
	) -> Result<Self, BuildError> {
		let keys = transform_all(elements, strategy);
		validate_keys(&keys)?;
		let trie = build_trie(&keys, config.bucket_size);
		log::debug!("hollow distributor: {} keys, {} trie nodes", keys.len(), trie.nodes.len());
		let label = label_keys(&trie, &keys);
		Ok(Distributor::Hollow(HollowTrieDistributor::build(
			&trie,
			label,
			config.temp_dir.as_deref(),
			config.mwhc_retry_budget as u64,
		)?))
	}

	/// Builds a relative-trie distributor; see [`Distributor::build_hollow`]
	/// for the input contract.
	pub fn build_relative<E: ?Sized>(
		elements: &[&E],
		strategy: &dyn TransformationStrategy<E>,
		config: &BuilderConfig,
	) -> Result<Self, BuildError> {
		let keys = transform_all(elements, strategy);
		validate_keys(&keys)?;
		let trie = build_trie(&keys, config.bucket_size);
		let delimiters = extract_delimiters(&keys, config.bucket_size);
		log::debug!("relative distributor: {} keys, {} delimiters, {} trie nodes", keys.len(), delimiters.len(), trie.nodes.len());
		Ok(Distributor::Relative(RelativeTrieDistributor::build(&trie, &delimiters, &keys, config.mwhc_retry_budget as u64)?))
	}

	/// Returns the bucket index for `element`, transformed by the same
	/// strategy used at construction. Undefined for elements outside the
	/// original set.
	pub fn get_long<E: ?Sized>(&self, element: &E, strategy: &dyn TransformationStrategy<E>) -> i64 {
		let key = strategy.to_bit_vector(element);
		match self {
			Distributor::Hollow(d) => d.query(&key) as i64,
			Distributor::Relative(d) => d.get_long(&key) as i64,
		}
	}

	/// Distributors are not membership testers: always `true`.
	pub fn contains_key<E: ?Sized>(&self, _element: &E) -> bool {
		true
	}

	/// Number of trie nodes built during construction (diagnostic).
	pub fn size(&self) -> i32 {
		match self {
			Distributor::Hollow(d) => d.size() as i32,
			Distributor::Relative(_) => 0,
		}
	}

	/// Total space used by the structure, in bits.
	pub fn num_bits(&self) -> i64 {
		match self {
			Distributor::Hollow(d) => d.num_bits() as i64,
			Distributor::Relative(d) => d.num_bits() as i64,
		}
	}
}

fn transform_all<E: ?Sized>(elements: &[&E], strategy: &dyn TransformationStrategy<E>) -> Vec<BitVector> {
	elements.iter().map(|e| strategy.to_bit_vector(e)).collect()
}

/// Confirms `keys` is strictly increasing and pairwise prefix-free, the
/// precondition every builder entry point relies on.
fn validate_keys(keys: &[BitVector]) -> Result<(), BuildError> {
	for i in 1..keys.len() {
		let (prev, cur) = (&keys[i - 1], &keys[i]);
		if prev == cur {
			return Err(BuildError::InvalidInput(InvalidInputKind::Duplicate { index: i }));
		}
		if cur < prev {
			return Err(BuildError::InvalidInput(InvalidInputKind::NotSorted { index: i }));
		}
		if prev.is_prefix_of(cur) || cur.is_prefix_of(prev) {
			return Err(BuildError::InvalidInput(InvalidInputKind::NotPrefixFree { index: i }));
		}
	}
	Ok(())
}

fn extract_delimiters(keys: &[BitVector], bucket_size: usize) -> Vec<BitVector> {
	let bucket_size = bucket_size.max(1);
	keys.iter().enumerate().filter(|(i, _)| (i + 1) % bucket_size == 0).map(|(_, k)| k.clone()).collect()
}

fn build_trie(keys: &[BitVector], bucket_size: usize) -> trie::FinalizedTrie {
	let mut builder = TrieBuilder::new();
	for d in extract_delimiters(keys, bucket_size) {
		builder.insert(&d);
	}
	builder.finalize()
}
