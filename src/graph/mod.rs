mod consistency;
mod measurement;
mod trajectory;

pub use consistency::{ConsistencyGraph, ConsistencyMatrix};
pub use measurement::{
    LoopClosures, MeasurementSet, RelativePoseMeasurement, RobotLocalMap, RobotMeasurements,
};
pub use trajectory::{build_trajectory, Trajectory, TrajectoryPose};
