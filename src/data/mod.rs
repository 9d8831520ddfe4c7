//! Homeowner datasets and the preparation step that derives the columns the
//! field catalog refers to.

mod dataset;
mod prepare;

pub use dataset::*;
pub use prepare::*;
