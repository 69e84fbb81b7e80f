use crate::num::{Matrix3, Matrix6, Number, Vector3, Vector6};
use crate::pose::LieGroup;

use nalgebra::{Isometry3, Translation3, UnitQuaternion};

pub type SE3Quat = Isometry3<Number>;

/// `[v]x` such that `[v]x * u = v x u`
#[inline]
pub fn skew(v: &Vector3) -> Matrix3 {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

impl LieGroup<6> for SE3Quat {
    const TRANSLATION_DOF: usize = 3;

    #[inline]
    fn identity() -> Self {
        Isometry3::identity()
    }

    #[inline]
    fn compose(&self, other: &Self) -> Self {
        self * other
    }

    #[inline]
    fn inverse(&self) -> Self {
        Isometry3::inverse(self)
    }

    fn adjoint(&self) -> Matrix6 {
        let rot = self.rotation.to_rotation_matrix().into_inner();
        let trans = self.translation.vector;

        // | R  [t]x R |
        // | 0    R    |
        let mut adjoint = Matrix6::zeros();
        adjoint.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot);
        adjoint
            .fixed_view_mut::<3, 3>(0, 3)
            .copy_from(&(skew(&trans) * rot));
        adjoint.fixed_view_mut::<3, 3>(3, 3).copy_from(&rot);
        adjoint
    }

    #[inline]
    fn log(&self) -> Vector6 {
        let trans = self.translation.vector;
        let rot = self.rotation.scaled_axis();
        Vector6::new(trans.x, trans.y, trans.z, rot.x, rot.y, rot.z)
    }

    #[inline]
    fn exp(tangent: &Vector6) -> Self {
        let trans = Translation3::new(tangent[0], tangent[1], tangent[2]);
        let axis = Vector3::new(tangent[3], tangent[4], tangent[5]);
        let rot = UnitQuaternion::from_scaled_axis(axis);
        Isometry3::from_parts(trans, rot)
    }
}

#[cfg(test)]
mod tests {
    use super::{skew, SE3Quat};
    use crate::num::{Vector3, Vector6};
    use crate::pose::LieGroup;

    use approx::assert_relative_eq;
    use nalgebra::{Quaternion, Translation3, UnitQuaternion};

    #[test]
    fn test_se3_update() {
        let a = Translation3::new(-5.3, 1.8, -9.6);
        let b = UnitQuaternion::from_quaternion(Quaternion::new(1.0, 2.0, 3.0, 1.0));
        let c = Translation3::new(1.5, 3.2, 7.6);

        let x = SE3Quat::from_parts(a, b);
        let y = SE3Quat::from_parts(c, b);

        // y = (y * x^-1) * x
        let delta = y * x.inverse();
        assert_relative_eq!((delta * x).log(), y.log(), epsilon = 1e-9);

        let z = <SE3Quat as LieGroup<6>>::identity();
        assert_relative_eq!((z * x.inverse() * x).log(), Vector6::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn test_skew_cross_product() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let u = Vector3::new(4.0, 5.0, 6.0);

        assert_relative_eq!(v.cross(&u), skew(&v) * u, epsilon = 1e-12);
    }

    #[test]
    fn test_se3_adjoint_conjugation() {
        let pose = SE3Quat::exp(&Vector6::new(1.0, -2.0, 0.5, 0.3, -0.2, 0.9));
        let xi = Vector6::new(1e-3, -2e-3, 1e-3, 2e-3, 1e-3, -1e-3);

        // T * exp(xi) * T^-1 == exp(Ad(T) * xi)
        let lhs = pose * SE3Quat::exp(&xi) * pose.inverse();
        let rhs = SE3Quat::exp(&(pose.adjoint() * xi));

        assert_relative_eq!(lhs.log(), rhs.log(), epsilon = 1e-4);
    }
}
