use super::base::LieGroup;
use crate::num::{Covariance, Tangent};

/// A pose together with its first-order Gaussian uncertainty.
#[derive(Clone, Copy, Debug)]
pub struct PoseWithCovariance<G, const D: usize>
where
    G: LieGroup<D>,
{
    pub pose: G,
    pub covariance: Covariance<D>,
}

impl<G, const D: usize> PoseWithCovariance<G, D>
where
    G: LieGroup<D>,
{
    #[inline]
    pub fn new(pose: G, covariance: Covariance<D>) -> Self {
        Self { pose, covariance }
    }

    /// Identity transform, known exactly.
    #[inline]
    pub fn identity() -> Self {
        Self::new(G::identity(), Covariance::<D>::zeros())
    }

    #[inline]
    pub fn tangent(&self) -> Tangent<D> {
        self.pose.log()
    }
}

/// out = a + b
///
/// The covariance of `a` is carried into the frame of `b` through the adjoint
/// of `b^-1`, then both uncertainties are summed.
pub fn compose<G, const D: usize>(
    a: &PoseWithCovariance<G, D>,
    b: &PoseWithCovariance<G, D>,
) -> PoseWithCovariance<G, D>
where
    G: LieGroup<D>,
{
    let adjoint_b_inv = b.pose.inverse().adjoint();
    let covariance = adjoint_b_inv * a.covariance * adjoint_b_inv.transpose() + b.covariance;

    PoseWithCovariance::new(a.pose.compose(&b.pose), symmetrize(covariance))
}

/// out = I - a
pub fn inverse<G, const D: usize>(a: &PoseWithCovariance<G, D>) -> PoseWithCovariance<G, D>
where
    G: LieGroup<D>,
{
    let adjoint_a = a.pose.adjoint();
    let covariance = adjoint_a * a.covariance * adjoint_a.transpose();

    PoseWithCovariance::new(a.pose.inverse(), symmetrize(covariance))
}

/// out = a - b
///
/// The pose of `a` seen from `b`, i.e. the `x` such that `b + x = a`. Both
/// operands are treated as independent.
#[inline]
pub fn inverse_compose<G, const D: usize>(
    a: &PoseWithCovariance<G, D>,
    b: &PoseWithCovariance<G, D>,
) -> PoseWithCovariance<G, D>
where
    G: LieGroup<D>,
{
    compose(&inverse(b), a)
}

#[inline]
fn symmetrize<const D: usize>(covariance: Covariance<D>) -> Covariance<D> {
    (covariance + covariance.transpose()) * 0.5
}
