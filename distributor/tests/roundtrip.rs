// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use mmph_distributor::{BuildError, BuilderConfig, Distributor, InvalidInputKind, NulTerminatedStrategy};

fn sorted_distinct_words(n: usize) -> Vec<Vec<u8>> {
	let mut words: Vec<Vec<u8>> = (0..n).map(|i| format!("key-{i:06}").into_bytes()).collect();
	words.sort();
	words.dedup();
	words
}

#[test]
fn ten_thousand_keys_round_trip_on_both_variants() {
	let words = sorted_distinct_words(10_000);
	let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
	let strategy = NulTerminatedStrategy;
	let config = BuilderConfig::new(32);

	let hollow = Distributor::build_hollow(&refs, &strategy, &config).unwrap();
	let relative = Distributor::build_relative(&refs, &strategy, &config).unwrap();

	for (i, key) in refs.iter().enumerate() {
		let expected = (i / 32) as i64;
		assert_eq!(hollow.get_long(*key, &strategy), expected, "hollow mismatch at key {i}");
		assert_eq!(relative.get_long(*key, &strategy), expected, "relative mismatch at key {i}");
	}
}

#[test]
fn duplicate_keys_are_rejected() {
	let words = vec![b"aaa".to_vec(), b"bbb".to_vec(), b"bbb".to_vec()];
	let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
	let strategy = NulTerminatedStrategy;
	let config = BuilderConfig::new(2);

	let err = Distributor::build_hollow(&refs, &strategy, &config).unwrap_err();
	assert!(matches!(err, BuildError::InvalidInput(InvalidInputKind::Duplicate { index: 2 })));
}

#[test]
fn out_of_order_keys_are_rejected() {
	let words = vec![b"bbb".to_vec(), b"aaa".to_vec()];
	let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
	let strategy = NulTerminatedStrategy;
	let config = BuilderConfig::new(2);

	let err = Distributor::build_hollow(&refs, &strategy, &config).unwrap_err();
	assert!(matches!(err, BuildError::InvalidInput(InvalidInputKind::NotSorted { index: 1 })));
}

#[test]
fn non_prefix_free_keys_are_rejected_without_a_terminating_strategy() {
	// Raw byte strings without a disambiguating terminator are not
	// prefix-free: "ab" is a byte-prefix of "abc".
	struct RawBytes;
	impl mmph_distributor::TransformationStrategy<[u8]> for RawBytes {
		fn to_bit_vector(&self, element: &[u8]) -> mmph_bitvec::BitVector {
			mmph_bitvec::BitVector::from_bytes(element)
		}
	}

	let words = vec![b"ab".to_vec(), b"abc".to_vec()];
	let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
	let strategy = RawBytes;
	let config = BuilderConfig::new(2);

	let err = Distributor::build_hollow(&refs, &strategy, &config).unwrap_err();
	assert!(matches!(err, BuildError::InvalidInput(InvalidInputKind::NotPrefixFree { index: 1 })));
}

#[test]
fn empty_input_is_a_valid_zero_bucket_distributor() {
	let refs: Vec<&[u8]> = Vec::new();
	let strategy = NulTerminatedStrategy;
	let config = BuilderConfig::new(16);

	let hollow = Distributor::build_hollow(&refs, &strategy, &config).unwrap();
	let relative = Distributor::build_relative(&refs, &strategy, &config).unwrap();
	assert_eq!(hollow.size(), 0);
	assert_eq!(hollow.num_bits(), 0);
	assert_eq!(relative.num_bits(), 0);
	assert_eq!(hollow.get_long(b"anything".as_slice(), &strategy), 0);
	assert_eq!(relative.get_long(b"anything".as_slice(), &strategy), 0);
}

#[test]
fn bucket_size_one_gives_every_key_its_own_bucket() {
	let words = sorted_distinct_words(64);
	let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
	let strategy = NulTerminatedStrategy;
	let config = BuilderConfig::new(1);

	let hollow = Distributor::build_hollow(&refs, &strategy, &config).unwrap();
	for (i, key) in refs.iter().enumerate() {
		assert_eq!(hollow.get_long(*key, &strategy), i as i64);
	}
}
