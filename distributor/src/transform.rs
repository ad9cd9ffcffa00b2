// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Maps user elements to the prefix-free bit vectors the trie builder
//! requires.
//!
//! Byte strings are not prefix-free on their own (`"ab"` is a byte-prefix of
//! `"abc"`), so every concrete strategy here appends some disambiguating
//! suffix before converting to bits.

use mmph_bitvec::BitVector;

/// Converts an `Element` into a bit vector suitable for trie construction.
/// Implementations must be injective over the key set supplied to a single
/// construction and must produce a prefix-free family of outputs.
pub trait TransformationStrategy<Element: ?Sized> {
	fn to_bit_vector(&self, element: &Element) -> BitVector;
}

/// Appends a single `0x00` byte to the input before converting to bits.
/// Prefix-free over any input that does not itself contain a NUL byte, since
/// the appended `0x00` can never be a genuine continuation of a shorter
/// sibling key.
#[derive(Clone, Copy, Debug, Default)]
pub struct NulTerminatedStrategy;

impl TransformationStrategy<[u8]> for NulTerminatedStrategy {
	fn to_bit_vector(&self, element: &[u8]) -> BitVector {
		let mut bytes = Vec::with_capacity(element.len() + 1);
		bytes.extend_from_slice(element);
		bytes.push(0);
		BitVector::from_bytes(&bytes)
	}
}

/// Prepends the element's big-endian byte length before its bytes. Always
/// prefix-free: a shorter key's length prefix differs from a longer key's,
/// so the two bit vectors diverge before either's payload is exhausted.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthPrefixedStrategy;

impl TransformationStrategy<[u8]> for LengthPrefixedStrategy {
	fn to_bit_vector(&self, element: &[u8]) -> BitVector {
		let len = element.len() as u64;
		let mut bytes = Vec::with_capacity(8 + element.len());
		bytes.extend_from_slice(&len.to_be_bytes());
		bytes.extend_from_slice(element);
		BitVector::from_bytes(&bytes)
	}
}

/// Pads or truncates every element to exactly `width` bytes, then appends a
/// single `1` bit as a terminator. Suitable for fixed-width keys (e.g. hash
/// digests) where every input is already the same length.
#[derive(Clone, Copy, Debug)]
pub struct FixedLengthStrategy {
	pub width: usize,
}

impl TransformationStrategy<[u8]> for FixedLengthStrategy {
	fn to_bit_vector(&self, element: &[u8]) -> BitVector {
		let mut bytes = vec![0u8; self.width];
		let n = element.len().min(self.width);
		bytes[..n].copy_from_slice(&element[..n]);
		let mut bv = BitVector::from_bytes(&bytes);
		bv.push(true);
		bv
	}
}
