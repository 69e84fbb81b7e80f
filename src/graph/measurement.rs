use super::trajectory::{build_trajectory, Trajectory};
use crate::num::NodeId;
use crate::pose::{LieGroup, PoseWithCovariance};

use std::collections::BTreeMap;

/// Poses ids of the loop closures, in discovery order.
///
/// The position in this list is the row/column of the loop closure in the
/// consistency matrix.
pub type LoopClosures = Vec<(NodeId, NodeId)>;

/// Transformation between two poses
#[derive(Clone, Copy, Debug)]
pub struct RelativePoseMeasurement<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub i: NodeId,
    pub j: NodeId,
    pub pose: PoseWithCovariance<G, D>,
    pub is_loop_closure: bool,
}

impl<G, const D: usize> RelativePoseMeasurement<G, D>
where
    G: LieGroup<D>,
{
    #[inline]
    pub fn new(i: NodeId, j: NodeId, pose: PoseWithCovariance<G, D>) -> Self {
        Self {
            i,
            j,
            pose,
            is_loop_closure: false,
        }
    }

    #[inline]
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.i, self.j)
    }
}

/// Measurements keyed by their `(i, j)` node pair.
#[derive(Clone, Debug)]
pub struct MeasurementSet<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub start_id: NodeId,
    pub end_id: NodeId,
    pub transforms: BTreeMap<(NodeId, NodeId), RelativePoseMeasurement<G, D>>,
    /// Keys in insertion order.
    order: Vec<(NodeId, NodeId)>,
}

impl<G, const D: usize> Default for MeasurementSet<G, D>
where
    G: LieGroup<D>,
{
    fn default() -> Self {
        Self {
            start_id: 0,
            end_id: 0,
            transforms: BTreeMap::new(),
            order: Vec::new(),
        }
    }
}

impl<G, const D: usize> MeasurementSet<G, D>
where
    G: LieGroup<D>,
{
    #[inline]
    pub fn get(&self, key: (NodeId, NodeId)) -> Option<&RelativePoseMeasurement<G, D>> {
        self.transforms.get(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Measurements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RelativePoseMeasurement<G, D>> {
        self.order.iter().filter_map(move |key| self.transforms.get(key))
    }

    /// Inserts a measurement, keeping the first one on a repeated key.
    fn insert(&mut self, measurement: RelativePoseMeasurement<G, D>) -> bool {
        let key = measurement.key();
        if self.transforms.contains_key(&key) {
            return false;
        }

        let (low, high) = (key.0.min(key.1), key.0.max(key.1));
        if self.transforms.is_empty() {
            self.start_id = low;
            self.end_id = high;
        } else {
            self.start_id = self.start_id.min(low);
            self.end_id = self.end_id.max(high);
        }

        self.transforms.insert(key, measurement);
        self.order.push(key);
        true
    }
}

/// Every measurement of one source, split into odometry and loop closures.
#[derive(Clone, Debug)]
pub struct RobotMeasurements<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub transforms: MeasurementSet<G, D>,
    pub loop_closures: LoopClosures,
    pub num_poses: usize,
}

impl<G, const D: usize> RobotMeasurements<G, D>
where
    G: LieGroup<D>,
{
    /// Degrees of freedom of the measurements, 3 in 2D and 6 in 3D.
    pub const DOF: usize = D;

    /// Classifies edges in file order.
    ///
    /// An edge is a loop closure when it does not extend the highest pose id
    /// seen so far (or when `only_loop_closures` is set). Otherwise it is
    /// odometry and moves the frontier forward.
    pub fn from_edges<I>(edges: I, only_loop_closures: bool) -> Self
    where
        I: IntoIterator<Item = RelativePoseMeasurement<G, D>>,
    {
        let mut transforms = MeasurementSet::default();
        let mut loop_closures = LoopClosures::new();
        let mut num_poses = 0;

        for mut edge in edges {
            if transforms.get(edge.key()).is_some() {
                log::warn!("Duplicated edge ({}, {}) ignored", edge.i, edge.j);
                continue;
            }

            let max_pair = edge.i.max(edge.j);
            if only_loop_closures || max_pair <= num_poses {
                edge.is_loop_closure = true;
                loop_closures.push(edge.key());
            } else {
                edge.is_loop_closure = false;
                num_poses = max_pair;
            }
            transforms.insert(edge);
        }

        Self {
            transforms,
            loop_closures,
            num_poses: num_poses + 1,
        }
    }
}

/// Local map of a single robot: its measurements and composed trajectory.
#[derive(Clone, Debug)]
pub struct RobotLocalMap<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub measurements: RobotMeasurements<G, D>,
    pub trajectory: Trajectory<G, D>,
}

impl<G, const D: usize> RobotLocalMap<G, D>
where
    G: LieGroup<D>,
{
    pub fn new(measurements: RobotMeasurements<G, D>) -> Self {
        let trajectory = build_trajectory(&measurements.transforms);
        Self {
            measurements,
            trajectory,
        }
    }

    #[inline]
    pub fn transforms(&self) -> &MeasurementSet<G, D> {
        &self.measurements.transforms
    }
}
