//! Parallel execution of the tile grid.
//!
//! C is split into independent MC×NC tiles; contiguous runs of tiles
//! ("stripes") go to rayon workers. The stripe count follows a cost
//! estimate, so small problems stay on the calling thread.
//!
//! - `dispatch`: per-tile beta scaling, K-chunk loop, parallel-for
//! - `scratch`: per-stripe packing buffer, stack or heap

pub mod dispatch;
pub mod scratch;

pub use scratch::Scratch;
