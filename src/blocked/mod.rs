//! Cache-blocked building blocks.
//!
//! These break one tile of C into K-chunks that fit in cache, pack the
//! operands for sequential access, then call the SIMD micro-kernels for
//! the inner computation.
//!
//! - `blocking`: MC/NC/KC derivation and tile arithmetic
//! - `pack`: panel packing shared by A, B and pre-packed B
//! - `macro_kernel`: walks one packed block, full and edge tiles
//! - `packed_b`: B packed once up front and reused across calls

pub mod blocking;
pub mod macro_kernel;
pub mod pack;
pub mod packed_b;

pub use blocking::{Blocking, Tile};
pub use packed_b::{PackedB, PackedLayout};
