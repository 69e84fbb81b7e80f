mod base;
mod ops;

pub use base::LieGroup;
pub use ops::{compose, inverse, inverse_compose, PoseWithCovariance};
