// Copyright 2024 The mmph-distributor authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Succinct data structures used to build monotone minimal perfect hash
//! distributors: rank/select over bit vectors, Elias-Fano monotone
//! sequences, a minimal-perfect-hash-style static function (MWHC), and the
//! 64-bit hash mixing they're all built on.

pub mod elias_fano;
pub mod hash;
pub mod mwhc;
pub mod packed;
pub mod rank9;
pub mod select;

pub use elias_fano::EliasFanoMonotoneList;
pub use mwhc::{Mwhc, MwhcConstructionError};
pub use packed::PackedInts;
pub use rank9::Rank9;
pub use select::SimpleSelect;
