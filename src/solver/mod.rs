mod base;
mod clique;
mod common;
mod consistency;

pub use base::Solver;
pub use clique::{MaxCliqueHeuristic, MaxCliqueSolver};
pub use common::{
    chi_squared_critical, information_matrix, legacy_threshold, squared_mahalanobis_distance,
    Confidence, FALLBACK_ROTATION_PRECISION,
};
pub use consistency::{compute_consistency_pose, PairwiseConsistency};
