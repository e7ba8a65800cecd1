//! Cache operations module
//!
//! Operations are implemented directly on [`DiskCache`](super::DiskCache).
//! Each one holds the key lock for its whole duration and notifies the
//! garbage collector after releasing it.

mod invalidate;
mod misc;
mod open;
mod utils;
mod write;
