use super::common::squared_mahalanobis_distance;
use crate::error::{Error, Result};
use crate::graph::{ConsistencyMatrix, MeasurementSet, RobotLocalMap, Trajectory};
use crate::num::{NodeId, Number};
use crate::pose::{compose, inverse_compose, LieGroup, PoseWithCovariance};

use itertools::Itertools;

/// Computes the consistency loop : aXij + abZjl + bXlk - abZik
///
/// The result is near the identity when the four measurements agree.
pub fn compute_consistency_pose<G, const D: usize>(
    a_x_ij: &PoseWithCovariance<G, D>,
    b_x_lk: &PoseWithCovariance<G, D>,
    ab_z_ik: &PoseWithCovariance<G, D>,
    ab_z_jl: &PoseWithCovariance<G, D>,
) -> PoseWithCovariance<G, D>
where
    G: LieGroup<D>,
{
    let out1 = compose(a_x_ij, ab_z_jl);
    let out2 = compose(&out1, b_x_lk);
    inverse_compose(&out2, ab_z_ik)
}

enum PairCheck {
    /// Both loop closures do not link the same two trajectories.
    NotInterRobot,
    /// The consistency loop covariance is not invertible.
    Singular,
    Distance(Number),
}

/// Pairwise consistency of inter-robot loop closures.
///
/// The loop closures `(i, k)` are ordered pairs, `i` on one trajectory and `k`
/// on the other.
pub struct PairwiseConsistency<'a, G, const D: usize>
where
    G: LieGroup<D>,
{
    pub robot1: &'a RobotLocalMap<G, D>,
    pub robot2: &'a RobotLocalMap<G, D>,
    pub interrobot: &'a MeasurementSet<G, D>,
    pub loop_closures: &'a [(NodeId, NodeId)],
}

impl<'a, G, const D: usize> PairwiseConsistency<'a, G, D>
where
    G: LieGroup<D>,
{
    pub fn new(
        robot1: &'a RobotLocalMap<G, D>,
        robot2: &'a RobotLocalMap<G, D>,
        interrobot: &'a MeasurementSet<G, D>,
        loop_closures: &'a [(NodeId, NodeId)],
    ) -> Self {
        Self {
            robot1,
            robot2,
            interrobot,
            loop_closures,
        }
    }

    #[inline]
    pub fn loop_closures(&self) -> &'a [(NodeId, NodeId)] {
        self.loop_closures
    }

    #[inline]
    pub fn transforms_robot1(&self) -> &'a MeasurementSet<G, D> {
        self.robot1.transforms()
    }

    #[inline]
    pub fn transforms_robot2(&self) -> &'a MeasurementSet<G, D> {
        self.robot2.transforms()
    }

    #[inline]
    pub fn transforms_interrobot(&self) -> &'a MeasurementSet<G, D> {
        self.interrobot
    }

    /// Computation of the consistency matrix
    ///
    /// Cell `(u, v)`, `u < v`, is set when the consistency loop of loop
    /// closures `u` and `v` has a squared Mahalanobis distance below
    /// `threshold` (a chi-squared critical value for `D` degrees of freedom).
    pub fn compute_consistency_matrix(&self, threshold: Number) -> Result<ConsistencyMatrix> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(Error::InvalidThreshold(threshold));
        }

        let mut consistency_matrix = ConsistencyMatrix::zeros(self.loop_closures.len());
        let mut num_tested = 0;
        let mut num_consistent = 0;

        for ((u, &loop_closure_1), (v, &loop_closure_2)) in
            self.loop_closures.iter().enumerate().tuple_combinations()
        {
            match self.check_pair(loop_closure_1, loop_closure_2)? {
                PairCheck::NotInterRobot => continue,
                PairCheck::Singular => {
                    log::warn!(
                        "Singular consistency loop for {:?} and {:?}, marked inconsistent",
                        loop_closure_1,
                        loop_closure_2
                    );
                    consistency_matrix.set(u, v, false);
                }
                PairCheck::Distance(distance) => {
                    // Apply threshold on the chi-squared distribution
                    let is_consistent = distance < threshold;
                    consistency_matrix.set(u, v, is_consistent);
                    num_consistent += is_consistent as usize;
                }
            }
            num_tested += 1;
        }

        log::debug!(
            "{} loop closures: {} pairs tested, {} consistent (threshold {})",
            self.loop_closures.len(),
            num_tested,
            num_consistent,
            threshold
        );
        Ok(consistency_matrix)
    }

    fn check_pair(
        &self,
        loop_closure_1: (NodeId, NodeId),
        loop_closure_2: (NodeId, NodeId),
    ) -> Result<PairCheck> {
        // Extract pose indexes
        let (i, k) = loop_closure_1;
        let (j, l) = loop_closure_2;

        let (trajectory_a, trajectory_b) = match self.select_trajectories(i, j, k, l) {
            Some(trajectories) => trajectories,
            None => return Ok(PairCheck::NotInterRobot),
        };

        // Extract transforms
        let ab_z_ik = self.interrobot_pose(loop_closure_1)?;
        let ab_z_jl = self.interrobot_pose(loop_closure_2)?;
        let a_x_ij = trajectory_a.relative(i, j)?;
        let b_x_lk = trajectory_b.relative(l, k)?;

        let consistency_pose = compute_consistency_pose(&a_x_ij, &b_x_lk, ab_z_ik, ab_z_jl);

        Ok(match squared_mahalanobis_distance(&consistency_pose) {
            Some(distance) => PairCheck::Distance(distance),
            None => PairCheck::Singular,
        })
    }

    /// Trajectories holding `{i, j}` and `{k, l}`, in that order.
    ///
    /// Robot 1 holding `{i, j}` wins when both assignments are possible.
    fn select_trajectories(
        &self,
        i: NodeId,
        j: NodeId,
        k: NodeId,
        l: NodeId,
    ) -> Option<(&'a Trajectory<G, D>, &'a Trajectory<G, D>)> {
        let trajectory_robot1 = &self.robot1.trajectory;
        let trajectory_robot2 = &self.robot2.trajectory;

        let holds = |trajectory: &Trajectory<G, D>, a: NodeId, b: NodeId| {
            trajectory.contains(a) && trajectory.contains(b)
        };

        let is_config_r12 = holds(trajectory_robot1, i, j) && holds(trajectory_robot2, k, l);
        let is_config_r21 = holds(trajectory_robot2, i, j) && holds(trajectory_robot1, k, l);

        if is_config_r12 {
            Some((trajectory_robot1, trajectory_robot2))
        } else if is_config_r21 {
            Some((trajectory_robot2, trajectory_robot1))
        } else {
            None
        }
    }

    #[inline]
    fn interrobot_pose(&self, key: (NodeId, NodeId)) -> Result<&'a PoseWithCovariance<G, D>> {
        self.interrobot
            .get(key)
            .map(|measurement| &measurement.pose)
            .ok_or(Error::MissingMeasurement(key.0, key.1))
    }
}
