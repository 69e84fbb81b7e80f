use crate::num::{Covariance, Tangent};

use std::fmt::Debug;

/// Rigid-body transformation group with `D` degrees of freedom.
///
/// Tangent vectors are ordered translation first, rotation last. The
/// perturbation model is `T * exp(xi)`, so covariances are expressed in the
/// local frame of the pose they belong to.
pub trait LieGroup<const D: usize>: Copy + Debug + Send + Sync + 'static {
    /// Number of leading tangent components describing translation.
    const TRANSLATION_DOF: usize;

    fn identity() -> Self;

    /// `self * other`
    fn compose(&self, other: &Self) -> Self;

    fn inverse(&self) -> Self;

    /// Adjoint matrix, `T * exp(xi) * T^-1 = exp(Ad(T) * xi)`.
    fn adjoint(&self) -> Covariance<D>;

    /// Translation and rotation vector of the transformation.
    fn log(&self) -> Tangent<D>;

    fn exp(tangent: &Tangent<D>) -> Self;
}
