pub type Number = f64;

/// Identifier of a pose (vertex) in a pose graph.
pub type NodeId = usize;

pub type Vector2 = nalgebra::Vector2<Number>;
pub type Vector3 = nalgebra::Vector3<Number>;
pub type Vector6 = nalgebra::Vector6<Number>;

pub type Matrix3 = nalgebra::Matrix3<Number>;
pub type Matrix6 = nalgebra::Matrix6<Number>;

/// Tangent-space vector of a `D`-dof pose.
pub type Tangent<const D: usize> = nalgebra::SVector<Number, D>;

/// Tangent-space covariance of a `D`-dof pose.
pub type Covariance<const D: usize> = nalgebra::SMatrix<Number, D, D>;
