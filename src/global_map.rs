//! Global map from the local maps of two robots.
//!
//! Keeps the largest set of pairwise consistent inter-robot loop closures.

use crate::config::{CliqueMethod, PcmConfig};
use crate::error::{Error, Result};
use crate::graph::{
    ConsistencyGraph, ConsistencyMatrix, LoopClosures, RelativePoseMeasurement, RobotLocalMap,
    RobotMeasurements,
};
use crate::io::{write_consistency_graph, write_g2o, write_loop_closures, G2oEdge, PoseGraph};
use crate::num::NodeId;
use crate::solver::{MaxCliqueHeuristic, MaxCliqueSolver, PairwiseConsistency, Solver};

use std::time::Instant;

pub struct GlobalMapSolver<'a, G, const D: usize>
where
    G: G2oEdge<D>,
{
    pub robot1: &'a RobotLocalMap<G, D>,
    pub robot2: &'a RobotLocalMap<G, D>,
    pub interrobot: &'a RobotMeasurements<G, D>,
}

/// Outcome of the consistency maximization.
#[derive(Debug)]
pub struct GlobalMapSolution<'a, G, const D: usize>
where
    G: G2oEdge<D>,
{
    pub consistency_matrix: ConsistencyMatrix,
    /// 1-based indices into the inter-robot loop closures.
    pub max_clique: Vec<usize>,
    /// Retained inter-robot loop closures.
    pub loop_closures: LoopClosures,

    robot1: &'a RobotLocalMap<G, D>,
    robot2: &'a RobotLocalMap<G, D>,
    interrobot: &'a RobotMeasurements<G, D>,
}

impl<'a, G, const D: usize> GlobalMapSolver<'a, G, D>
where
    G: G2oEdge<D>,
{
    pub fn new(
        robot1: &'a RobotLocalMap<G, D>,
        robot2: &'a RobotLocalMap<G, D>,
        interrobot: &'a RobotMeasurements<G, D>,
    ) -> Self {
        Self {
            robot1,
            robot2,
            interrobot,
        }
    }

    pub fn solve(&self, config: &PcmConfig) -> Result<GlobalMapSolution<'a, G, D>> {
        let threshold = config.threshold_for(D)?;
        let loop_closures = &self.interrobot.loop_closures;

        let start = Instant::now();
        let pcm = PairwiseConsistency::new(
            self.robot1,
            self.robot2,
            &self.interrobot.transforms,
            loop_closures,
        );
        let consistency_matrix = pcm.compute_consistency_matrix(threshold)?;
        log::info!(
            "Consistency matrix of {} loop closures computed in {:?}",
            loop_closures.len(),
            start.elapsed()
        );

        if let Some(path) = &config.consistency_graph_path {
            write_consistency_graph(&consistency_matrix, path)?;
        }

        let start = Instant::now();
        let graph = ConsistencyGraph::from(&consistency_matrix);
        let max_clique = solve_max_clique(&graph, config);
        log::info!(
            "Maximum clique of {} vertices found in {:?}",
            max_clique.len(),
            start.elapsed()
        );

        let retained = max_clique
            .iter()
            .map(|&index| {
                index
                    .checked_sub(1)
                    .and_then(|u| loop_closures.get(u))
                    .copied()
                    .ok_or(Error::CliqueIndexOutOfRange {
                        index,
                        len: loop_closures.len(),
                    })
            })
            .collect::<Result<LoopClosures>>()?;

        if let Some(path) = &config.loop_closures_path {
            write_loop_closures(&retained, path)?;
        }

        let solution = GlobalMapSolution {
            consistency_matrix,
            max_clique,
            loop_closures: retained,
            robot1: self.robot1,
            robot2: self.robot2,
            interrobot: self.interrobot,
        };

        if let Some(path) = &config.pose_graph_path {
            write_g2o(path, solution.retained_measurements())?;
        }
        Ok(solution)
    }
}

fn solve_max_clique(graph: &ConsistencyGraph, config: &PcmConfig) -> Vec<usize> {
    match (config.clique_method, config.clique_budget) {
        (CliqueMethod::Exact, Some(budget)) => MaxCliqueSolver {
            graph,
            lower_bound: 0,
        }
        .solve(budget),
        (CliqueMethod::Exact, None) => MaxCliqueSolver {
            graph,
            lower_bound: 0,
        }
        .solve_to_end(),
        (CliqueMethod::Heuristic, Some(budget)) => MaxCliqueHeuristic { graph }.solve(budget),
        (CliqueMethod::Heuristic, None) => MaxCliqueHeuristic { graph }.solve_to_end(),
    }
}

impl<'a, G, const D: usize> GlobalMapSolution<'a, G, D>
where
    G: G2oEdge<D>,
{
    #[inline]
    pub fn max_clique_size(&self) -> usize {
        self.max_clique.len()
    }

    #[inline]
    pub fn is_retained(&self, loop_closure: (NodeId, NodeId)) -> bool {
        self.loop_closures.contains(&loop_closure)
    }

    /// Measurements of both robots followed by the retained inter-robot
    /// loop closures.
    pub fn retained_measurements(
        &self,
    ) -> impl Iterator<Item = &'a RelativePoseMeasurement<G, D>> + '_ {
        let interrobot = self.interrobot;
        self.robot1
            .transforms()
            .iter()
            .chain(self.robot2.transforms().iter())
            .chain(
                self.loop_closures
                    .iter()
                    .filter_map(move |&key| interrobot.transforms.get(key)),
            )
    }
}

/// Runs the consistency maximization on measurements read from files.
///
/// Returns the retained inter-robot loop closures. The three graphs must
/// share one dimension.
pub fn solve_pose_graphs(
    robot1: PoseGraph,
    robot2: PoseGraph,
    interrobot: PoseGraph,
    config: &PcmConfig,
) -> Result<LoopClosures> {
    match (robot1, robot2, interrobot) {
        (PoseGraph::Planar(robot1), PoseGraph::Planar(robot2), PoseGraph::Planar(interrobot)) => {
            solve_local_maps(robot1, robot2, interrobot, config)
        }
        (
            PoseGraph::Spatial(robot1),
            PoseGraph::Spatial(robot2),
            PoseGraph::Spatial(interrobot),
        ) => solve_local_maps(robot1, robot2, interrobot, config),
        (robot1, robot2, interrobot) => {
            let expected = robot1.dof();
            let found = [robot2.dof(), interrobot.dof()]
                .into_iter()
                .find(|&dof| dof != expected)
                .unwrap_or(expected);
            Err(Error::DimensionMismatch { expected, found })
        }
    }
}

fn solve_local_maps<G, const D: usize>(
    robot1: RobotMeasurements<G, D>,
    robot2: RobotMeasurements<G, D>,
    interrobot: RobotMeasurements<G, D>,
    config: &PcmConfig,
) -> Result<LoopClosures>
where
    G: G2oEdge<D>,
{
    let robot1 = RobotLocalMap::new(robot1);
    let robot2 = RobotLocalMap::new(robot2);
    log::info!(
        "Robot 1: {} poses, robot 2: {} poses, {} inter-robot loop closures",
        robot1.measurements.num_poses,
        robot2.measurements.num_poses,
        interrobot.loop_closures.len()
    );

    let solution = GlobalMapSolver::new(&robot1, &robot2, &interrobot).solve(config)?;
    Ok(solution.loop_closures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::{Covariance, Vector3};
    use crate::pose::{LieGroup, PoseWithCovariance};
    use crate::slam2d::SE2;

    fn measurement(
        i: NodeId,
        j: NodeId,
        x: f64,
        y: f64,
        theta: f64,
    ) -> RelativePoseMeasurement<SE2, 3> {
        RelativePoseMeasurement::new(
            i,
            j,
            PoseWithCovariance::new(
                SE2::exp(&Vector3::new(x, y, theta)),
                Covariance::<3>::identity() * 0.01,
            ),
        )
    }

    fn local_map(first: NodeId) -> RobotLocalMap<SE2, 3> {
        let edges = (first..first + 4).map(|i| measurement(i, i + 1, 1.0, 0.0, 0.0));
        RobotLocalMap::new(RobotMeasurements::from_edges(edges, false))
    }

    fn in_memory() -> PcmConfig {
        PcmConfig {
            consistency_graph_path: None,
            loop_closures_path: None,
            ..PcmConfig::default()
        }
    }

    #[test]
    fn test_outlier_is_rejected() {
        let robot1 = local_map(0);
        let robot2 = local_map(10);
        // robot 2 frame is robot 1 frame shifted by 5 along y
        let interrobot = RobotMeasurements::from_edges(
            vec![
                measurement(0, 10, 0.0, 5.0, 0.0),
                measurement(1, 11, 0.0, 5.0, 0.0),
                measurement(2, 12, 0.0, 5.0, 0.0),
                measurement(3, 13, 4.0, -3.0, 1.0),
            ],
            true,
        );

        for method in [CliqueMethod::Exact, CliqueMethod::Heuristic] {
            let config = PcmConfig {
                clique_method: method,
                ..in_memory()
            };
            let solution = GlobalMapSolver::new(&robot1, &robot2, &interrobot)
                .solve(&config)
                .unwrap();

            assert_eq!(solution.max_clique, vec![1, 2, 3]);
            assert_eq!(solution.loop_closures, vec![(0, 10), (1, 11), (2, 12)]);
            assert!(!solution.is_retained((3, 13)));
            assert_eq!(solution.retained_measurements().count(), 4 + 4 + 3);
        }
    }

    #[test]
    fn test_small_clique_budget_keeps_loop_closures() {
        let robot1 = local_map(0);
        let robot2 = local_map(10);
        let interrobot = RobotMeasurements::from_edges(
            vec![
                measurement(0, 10, 0.0, 5.0, 0.0),
                measurement(1, 11, 0.0, 5.0, 0.0),
                measurement(2, 12, 0.0, 5.0, 0.0),
                measurement(3, 13, 4.0, -3.0, 1.0),
            ],
            true,
        );

        let config = PcmConfig {
            clique_budget: Some(1),
            ..in_memory()
        };
        let solution = GlobalMapSolver::new(&robot1, &robot2, &interrobot)
            .solve(&config)
            .unwrap();

        assert_eq!(solution.loop_closures.len(), 2);
        assert!(!solution.is_retained((3, 13)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let planar = || {
            PoseGraph::Planar(RobotMeasurements::from_edges(
                vec![measurement(0, 1, 1.0, 0.0, 0.0)],
                false,
            ))
        };
        let spatial = PoseGraph::Spatial(RobotMeasurements::from_edges(vec![], true));

        match solve_pose_graphs(planar(), planar(), spatial, &in_memory()) {
            Err(Error::DimensionMismatch { expected, found }) => {
                assert_eq!(expected, 3);
                assert_eq!(found, 6);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
