use crate::num::{Covariance, Number};
use crate::pose::{LieGroup, PoseWithCovariance};

mod consts {
    /// Variances below this are treated as zero.
    pub const DEGENERATE_VARIANCE: f64 = 1e-12;
    /// Precision assumed on a rotation axis measured with zero variance.
    pub const FALLBACK_ROTATION_PRECISION: f64 = 1000.0;
}

pub use consts::FALLBACK_ROTATION_PRECISION;

/// Confidence level of a chi-squared critical value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    P90,
    P95,
    P99,
}

impl Confidence {
    pub fn from_probability(probability: f64) -> Option<Self> {
        const TOLERANCE: f64 = 1e-9;
        [(0.90, Self::P90), (0.95, Self::P95), (0.99, Self::P99)]
            .iter()
            .find(|(p, _)| (p - probability).abs() < TOLERANCE)
            .map(|(_, confidence)| *confidence)
    }
}

/// Critical value of the chi-squared distribution for `dof` degrees of
/// freedom, or `None` outside the 1..=6 table.
pub fn chi_squared_critical(dof: usize, confidence: Confidence) -> Option<f64> {
    //        p=0.10  p=0.05  p=0.01
    const TABLE: [[f64; 3]; 6] = [
        [2.706, 3.841, 6.635],
        [4.605, 5.991, 9.210],
        [6.251, 7.815, 11.345],
        [7.779, 9.488, 13.277],
        [9.236, 11.070, 15.086],
        [10.645, 12.592, 16.812],
    ];

    let column = match confidence {
        Confidence::P90 => 0,
        Confidence::P95 => 1,
        Confidence::P99 => 2,
    };
    dof.checked_sub(1)
        .and_then(|row| TABLE.get(row))
        .map(|row| row[column])
}

/// Hand-picked thresholds of the first multi-robot experiments.
pub fn legacy_threshold(dof: usize) -> f64 {
    if dof == 3 {
        0.58
    } else {
        2.20
    }
}

/// Inverse of a residual covariance.
///
/// Rotation axes with a zero variance get the fallback precision, decoupled
/// from the other axes. Returns the information matrix and whether the
/// fallback was applied, or `None` when the covariance stays singular.
pub fn information_matrix<const D: usize>(
    covariance: &Covariance<D>,
    translation_dof: usize,
) -> Option<(Covariance<D>, bool)> {
    let mut covariance = *covariance;
    let mut is_regularized = false;

    for axis in translation_dof..D {
        if covariance[(axis, axis)].abs() < consts::DEGENERATE_VARIANCE {
            covariance.row_mut(axis).fill(0.0);
            covariance.column_mut(axis).fill(0.0);
            covariance[(axis, axis)] = 1.0 / consts::FALLBACK_ROTATION_PRECISION;
            is_regularized = true;
        }
    }

    covariance
        .try_inverse()
        .map(|information| (information, is_regularized))
}

/// Squared Mahalanobis distance of a pose from the identity.
///
/// `None` when the covariance cannot be inverted, even with the rotation
/// fallback.
pub fn squared_mahalanobis_distance<G, const D: usize>(
    transform: &PoseWithCovariance<G, D>,
) -> Option<Number>
where
    G: LieGroup<D>,
{
    let (information, is_regularized) =
        information_matrix(&transform.covariance, G::TRANSLATION_DOF)?;
    if is_regularized {
        log::warn!(
            "Covariance on rotation null (leads to a division by zero), using precision {}",
            consts::FALLBACK_ROTATION_PRECISION
        );
    }

    let pose_vector = transform.tangent();
    Some(pose_vector.dot(&(information * pose_vector)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::{Matrix3, Vector3};
    use crate::slam2d::SE2;

    use approx::assert_relative_eq;

    #[test]
    fn test_chi_squared_table() {
        // chi-squared value (p=0.05, n=3)
        assert_eq!(chi_squared_critical(3, Confidence::P95), Some(7.815));
        // chi-squared value (p=0.05, n=6)
        assert_eq!(chi_squared_critical(6, Confidence::P95), Some(12.592));
        assert_eq!(chi_squared_critical(0, Confidence::P95), None);
        assert_eq!(chi_squared_critical(7, Confidence::P99), None);
        assert_eq!(Confidence::from_probability(0.99), Some(Confidence::P99));
        assert_eq!(Confidence::from_probability(0.5), None);
    }

    #[test]
    fn test_mahalanobis_distance_scales_with_covariance() {
        let pose = SE2::exp(&Vector3::new(0.2, 0.0, 0.0));
        let tight = PoseWithCovariance::new(pose, Matrix3::identity() * 0.01);
        let loose = PoseWithCovariance::new(pose, Matrix3::identity() * 1.0);

        assert_relative_eq!(squared_mahalanobis_distance(&tight).unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(squared_mahalanobis_distance(&loose).unwrap(), 0.04, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_rotation_variance_uses_fallback() {
        let pose = SE2::exp(&Vector3::new(0.0, 0.0, 0.1));
        let mut covariance = Matrix3::identity();
        covariance[(2, 2)] = 0.0;
        covariance[(0, 2)] = 0.5;
        covariance[(2, 0)] = 0.5;
        let transform = PoseWithCovariance::new(pose, covariance);

        let distance = squared_mahalanobis_distance(&transform).unwrap();
        assert!(distance.is_finite());
        assert_relative_eq!(distance, 0.01 * FALLBACK_ROTATION_PRECISION, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_translation_covariance() {
        let pose = SE2::exp(&Vector3::new(1.0, 0.0, 0.0));
        let transform = PoseWithCovariance::new(pose, Matrix3::zeros());
        let mut covariance = Matrix3::zeros();
        covariance[(2, 2)] = 1.0;

        assert!(squared_mahalanobis_distance(&transform).is_none());
        assert!(information_matrix(&covariance, 2).is_none());
    }
}
