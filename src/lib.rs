//! Pairwise Consistency Maximization (PCM) of inter-robot loop closures.
//!
//! Two robots each build a pose graph in their own frame. Inter-robot loop
//! closures link the graphs, but some are outliers. Every pair of loop
//! closures is checked for geometric consistency through the two
//! trajectories, and the largest set of pairwise consistent loop closures
//! (a maximum clique of the consistency graph) is kept.

pub mod config;
pub mod error;
pub mod global_map;
pub mod graph;
pub mod io;
pub mod num;
pub mod pose;
pub mod slam2d;
pub mod slam3d;
pub mod solver;

pub use config::{CliqueMethod, PcmConfig};
pub use error::{Error, Result};
pub use global_map::{solve_pose_graphs, GlobalMapSolution, GlobalMapSolver};
