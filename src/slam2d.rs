use crate::num::{Matrix3, Number, Vector2, Vector3};
use crate::pose::LieGroup;

use nalgebra::Isometry2;

pub type SE2 = Isometry2<Number>;

impl LieGroup<3> for SE2 {
    const TRANSLATION_DOF: usize = 2;

    #[inline]
    fn identity() -> Self {
        Isometry2::identity()
    }

    #[inline]
    fn compose(&self, other: &Self) -> Self {
        self * other
    }

    #[inline]
    fn inverse(&self) -> Self {
        Isometry2::inverse(self)
    }

    #[rustfmt::skip]
    fn adjoint(&self) -> Matrix3 {
        let rot = self.rotation.to_rotation_matrix().into_inner();
        let trans = self.translation.vector;

        Matrix3::new(
            rot[(0, 0)], rot[(0, 1)], trans.y,
            rot[(1, 0)], rot[(1, 1)], -trans.x,
            0.0, 0.0, 1.0,
        )
    }

    #[inline]
    fn log(&self) -> Vector3 {
        let trans = self.translation.vector;
        Vector3::new(trans.x, trans.y, self.rotation.angle())
    }

    #[inline]
    fn exp(tangent: &Vector3) -> Self {
        Isometry2::new(Vector2::new(tangent.x, tangent.y), tangent.z)
    }
}

#[cfg(test)]
mod tests {
    use super::SE2;
    use crate::num::Vector3;
    use crate::pose::LieGroup;

    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_se2_adjoint_conjugation() {
        let pose = SE2::exp(&Vector3::new(1.5, -0.7, FRAC_PI_2));
        let xi = Vector3::new(1e-3, 2e-3, -3e-3);

        // T * exp(xi) * T^-1 == exp(Ad(T) * xi)
        let lhs = pose * SE2::exp(&xi) * pose.inverse();
        let rhs = SE2::exp(&(pose.adjoint() * xi));

        assert_relative_eq!(lhs.log(), rhs.log(), epsilon = 1e-4);
    }

    #[test]
    fn test_se2_log_exp() {
        let xi = Vector3::new(3.0, -2.0, 0.4);
        assert_relative_eq!(SE2::exp(&xi).log(), xi, epsilon = 1e-12);
    }
}
