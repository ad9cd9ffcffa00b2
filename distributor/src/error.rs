// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Construction error types.

use std::fmt;

/// Why a key set was rejected during construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidInputKind {
	/// `keys[index]` is equal to `keys[index - 1]`.
	Duplicate { index: usize },
	/// `keys[index]` sorts before `keys[index - 1]`.
	NotSorted { index: usize },
	/// `keys[index - 1]` is a bit-prefix of `keys[index]` (or vice versa).
	NotPrefixFree { index: usize },
}

impl fmt::Display for InvalidInputKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			InvalidInputKind::Duplicate { index } => write!(f, "key at index {index} duplicates its predecessor"),
			InvalidInputKind::NotSorted { index } => {
				write!(f, "key at index {index} is not lexicographically greater than its predecessor")
			}
			InvalidInputKind::NotPrefixFree { index } => {
				write!(f, "key at index {index} is not prefix-free with respect to its predecessor")
			}
		}
	}
}

/// Errors that can abort distributor construction.
#[derive(Debug)]
pub enum BuildError {
	InvalidInput(InvalidInputKind),
	TempFileIo(std::io::Error),
	MwhcConstruction,
}

impl fmt::Display for BuildError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BuildError::InvalidInput(kind) => write!(f, "invalid input: {kind}"),
			BuildError::TempFileIo(e) => write!(f, "temporary file I/O failure: {e}"),
			BuildError::MwhcConstruction => write!(f, "MWHC construction did not converge within its retry budget"),
		}
	}
}

impl std::error::Error for BuildError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			BuildError::TempFileIo(e) => Some(e),
			_ => None,
		}
	}
}

impl From<std::io::Error> for BuildError {
	fn from(e: std::io::Error) -> Self {
		BuildError::TempFileIo(e)
	}
}

impl From<mmph_succinct::MwhcConstructionError> for BuildError {
	fn from(_: mmph_succinct::MwhcConstructionError) -> Self {
		BuildError::MwhcConstruction
	}
}
