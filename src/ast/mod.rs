//! Expression trees, runtime values and per-row evaluation traces.

pub mod expression;
pub mod trace;
pub mod value;

pub use expression::*;
pub use trace::*;
pub use value::*;
