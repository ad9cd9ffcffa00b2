// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Spills the labelling pass's raw (node, path, behaviour) records through a
//! temporary file, bounding peak in-memory state during construction the
//! way the design's resource model describes, instead of holding every
//! record in a `Vec` for the whole pass. The file is created and deleted
//! through `tempfile::NamedTempFile`'s RAII guard, so it is cleaned up on
//! both the success path and any early return via `?`.
//!
//! Wire format per record: big-endian 64-bit node index, a big-endian
//! 32-bit path length in bits, the path's own bits packed most-significant-
//! bit-first (padded to a byte boundary), then a single behaviour byte.

use crate::error::BuildError;
use crate::trie::Behaviour;
use mmph_bitvec::BitVector;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn pack_bits(path: &BitVector) -> Vec<u8> {
	let mut bytes = vec![0u8; path.len().div_ceil(8)];
	for (i, bit) in path.iter().enumerate() {
		if bit {
			bytes[i / 8] |= 0x80 >> (i % 8);
		}
	}
	bytes
}

/// Writes `records` to a fresh temporary file and immediately reads them
/// back, round-tripping the (node, path, behaviour) stream through disk.
pub(crate) fn spill_and_reload(
	records: Vec<(u64, BitVector, Behaviour)>,
	temp_dir: Option<&Path>,
) -> Result<Vec<(u64, BitVector, Behaviour)>, BuildError> {
	let mut file = match temp_dir {
		Some(dir) => NamedTempFile::new_in(dir)?,
		None => NamedTempFile::new()?,
	};

	for (node_index, path, behaviour) in &records {
		file.write_all(&node_index.to_be_bytes())?;
		file.write_all(&(path.len() as u32).to_be_bytes())?;
		file.write_all(&pack_bits(path))?;
		file.write_all(&[*behaviour as u8])?;
	}
	file.flush()?;
	file.as_file_mut().seek(SeekFrom::Start(0))?;

	let mut out = Vec::with_capacity(records.len());
	let mut node_buf = [0u8; 8];
	let mut len_buf = [0u8; 4];
	let mut beh_buf = [0u8; 1];
	loop {
		match file.read_exact(&mut node_buf) {
			Ok(()) => {}
			Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
			Err(e) => return Err(e.into()),
		}
		file.read_exact(&mut len_buf)?;
		let node_index = u64::from_be_bytes(node_buf);
		let len = u32::from_be_bytes(len_buf) as usize;

		let mut packed = vec![0u8; len.div_ceil(8)];
		file.read_exact(&mut packed)?;
		file.read_exact(&mut beh_buf)?;

		let path = BitVector::from_bytes(&packed).sub_vector(0, len);
		let behaviour = Behaviour::from_u64(beh_buf[0] as u64);
		out.push((node_index, path, behaviour));
	}

	Ok(out)
}
