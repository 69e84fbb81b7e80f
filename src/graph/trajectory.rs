use super::measurement::MeasurementSet;
use crate::error::{Error, Result};
use crate::num::NodeId;
use crate::pose::{compose, inverse_compose, LieGroup, PoseWithCovariance};

use std::collections::BTreeMap;

/// Pose of a trajectory node relative to the trajectory anchor.
#[derive(Clone, Copy, Debug)]
pub struct TrajectoryPose<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub id: NodeId,
    pub pose: PoseWithCovariance<G, D>,
}

/// Chain of odometry poses covering `[start_id, end_id]` without gaps.
#[derive(Clone, Debug)]
pub struct Trajectory<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub start_id: NodeId,
    pub end_id: NodeId,
    pub trajectory_poses: BTreeMap<NodeId, TrajectoryPose<G, D>>,
}

impl<G, const D: usize> Trajectory<G, D>
where
    G: LieGroup<D>,
{
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.trajectory_poses.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.trajectory_poses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trajectory_poses.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Result<&TrajectoryPose<G, D>> {
        self.trajectory_poses
            .get(&id)
            .ok_or(Error::NodeNotInTrajectory {
                id,
                start_id: self.start_id,
                end_id: self.end_id,
            })
    }

    /// Transformation from pose `from` to pose `to` along the trajectory.
    pub fn relative(&self, from: NodeId, to: NodeId) -> Result<PoseWithCovariance<G, D>> {
        let pose_from = self.get(from)?;
        let pose_to = self.get(to)?;
        Ok(inverse_compose(&pose_to.pose, &pose_from.pose))
    }
}

/// Precomputes the trajectory by composing the successive odometry edges.
///
/// The first node sits at the origin with no uncertainty. The chain stops at
/// the first missing `(id, id + 1)` edge or at a loop closure.
pub fn build_trajectory<G, const D: usize>(transforms: &MeasurementSet<G, D>) -> Trajectory<G, D>
where
    G: LieGroup<D>,
{
    let start_id = transforms.start_id;

    let mut current_id = start_id;
    let mut current_pose = PoseWithCovariance::identity();

    let mut trajectory_poses = BTreeMap::new();
    trajectory_poses.insert(
        current_id,
        TrajectoryPose {
            id: current_id,
            pose: current_pose,
        },
    );

    while let Some(odometry) = transforms
        .get((current_id, current_id + 1))
        .filter(|t| !t.is_loop_closure)
    {
        current_pose = compose(&current_pose, &odometry.pose);
        current_id += 1;
        trajectory_poses.insert(
            current_id,
            TrajectoryPose {
                id: current_id,
                pose: current_pose,
            },
        );
    }

    if current_id < transforms.end_id {
        log::debug!(
            "Trajectory stops at pose {} before the last pose {}",
            current_id,
            transforms.end_id
        );
    }

    Trajectory {
        start_id,
        end_id: current_id,
        trajectory_poses,
    }
}
