//! Fixed point numbers, binary angles and the fine trig tables used by the
//! software renderer.
//!
//! Everything in here follows the 16.16 arithmetic of the original engine so
//! that a frame rendered with it is reproducible bit-for-bit.

mod angle;
mod fixed_point;
mod trig;

pub use angle::*;
pub use fixed_point::*;
pub use trig::*;
