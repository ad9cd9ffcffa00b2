// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use mmph_distributor::{BuilderConfig, Distributor, NulTerminatedStrategy};
use quickcheck::{quickcheck, TestResult};
use std::collections::BTreeSet;

fn build_sorted_words(raw: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
	let set: BTreeSet<Vec<u8>> = raw.into_iter().filter(|w| !w.is_empty()).collect();
	set.into_iter().collect()
}

fn bucket_size_for(len: usize, shift: u8) -> usize {
	let b = 1usize << (shift as usize % 6); // 1..=32
	b.max(1).min(len.max(1))
}

quickcheck! {
	/// Every key's bucket equals floor(rank / bucket_size), for both variants.
	fn bucket_matches_rank_over_bucket_size(raw: Vec<Vec<u8>>, shift: u8) -> TestResult {
		let words = build_sorted_words(raw);
		if words.len() < 2 {
			return TestResult::discard();
		}
		let bucket_size = bucket_size_for(words.len(), shift);
		let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
		let strategy = NulTerminatedStrategy;
		let config = BuilderConfig::new(bucket_size);

		let hollow = match Distributor::build_hollow(&refs, &strategy, &config) {
			Ok(d) => d,
			Err(_) => return TestResult::discard(),
		};
		let relative = match Distributor::build_relative(&refs, &strategy, &config) {
			Ok(d) => d,
			Err(_) => return TestResult::discard(),
		};

		for (i, key) in refs.iter().enumerate() {
			let expected = (i / bucket_size) as i64;
			if hollow.get_long(*key, &strategy) != expected {
				return TestResult::error(format!("hollow: key {i} expected {expected}"));
			}
			if relative.get_long(*key, &strategy) != expected {
				return TestResult::error(format!("relative: key {i} expected {expected}"));
			}
		}
		TestResult::passed()
	}

	/// Bucket assignment is monotone non-decreasing along the sorted key order.
	fn bucket_assignment_is_monotone(raw: Vec<Vec<u8>>, shift: u8) -> TestResult {
		let words = build_sorted_words(raw);
		if words.len() < 2 {
			return TestResult::discard();
		}
		let bucket_size = bucket_size_for(words.len(), shift);
		let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
		let strategy = NulTerminatedStrategy;
		let config = BuilderConfig::new(bucket_size);
		let Ok(d) = Distributor::build_hollow(&refs, &strategy, &config) else {
			return TestResult::discard();
		};

		let mut prev = d.get_long(refs[0], &strategy);
		for key in &refs[1..] {
			let cur = d.get_long(*key, &strategy);
			if cur < prev {
				return TestResult::error("bucket index decreased along sorted order");
			}
			prev = cur;
		}
		TestResult::passed()
	}

	/// Construction is deterministic: building twice from the same input
	/// yields the same space usage and the same query answers.
	fn construction_is_deterministic(raw: Vec<Vec<u8>>, shift: u8) -> TestResult {
		let words = build_sorted_words(raw);
		if words.is_empty() {
			return TestResult::discard();
		}
		let bucket_size = bucket_size_for(words.len(), shift);
		let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
		let strategy = NulTerminatedStrategy;
		let config = BuilderConfig::new(bucket_size);

		let Ok(d1) = Distributor::build_hollow(&refs, &strategy, &config) else {
			return TestResult::discard();
		};
		let Ok(d2) = Distributor::build_hollow(&refs, &strategy, &config) else {
			return TestResult::discard();
		};
		if d1.num_bits() != d2.num_bits() {
			return TestResult::error("space usage differed across identical builds");
		}
		for key in &refs {
			if d1.get_long(*key, &strategy) != d2.get_long(*key, &strategy) {
				return TestResult::error("query answer differed across identical builds");
			}
		}
		TestResult::passed()
	}

	/// Total space is always within a small constant factor of N * B's
	/// theoretical lower bound (loose upper bound, just a sanity backstop
	/// against an accidental quadratic blow-up).
	fn space_is_roughly_linear_in_key_count(raw: Vec<Vec<u8>>, shift: u8) -> TestResult {
		let words = build_sorted_words(raw);
		if words.len() < 4 {
			return TestResult::discard();
		}
		let bucket_size = bucket_size_for(words.len(), shift);
		let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
		let strategy = NulTerminatedStrategy;
		let config = BuilderConfig::new(bucket_size);
		let Ok(d) = Distributor::build_hollow(&refs, &strategy, &config) else {
			return TestResult::discard();
		};

		let max_key_bits: usize = words.iter().map(|w| (w.len() + 1) * 8).max().unwrap_or(1);
		let generous_bound = (words.len() as u64) * (max_key_bits as u64) * 4 + 4096;
		if d.num_bits() as u64 > generous_bound {
			return TestResult::error(format!("num_bits {} exceeded generous bound {}", d.num_bits(), generous_bound));
		}
		TestResult::passed()
	}
}

#[test]
fn empty_input_is_always_bucket_zero() {
	let refs: Vec<&[u8]> = Vec::new();
	let strategy = NulTerminatedStrategy;
	let config = BuilderConfig::new(8);
	let d = Distributor::build_hollow(&refs, &strategy, &config).unwrap();
	assert_eq!(d.get_long(b"x".as_slice(), &strategy), 0);
}
