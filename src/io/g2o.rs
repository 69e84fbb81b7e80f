//! Reader and writer of `.g2o` pose-graph edge files.
//!
//! Format: <https://github.com/RainerKuemmerle/g2o/wiki/File-Format>. Only
//! `EDGE_SE2` and `EDGE_SE3:QUAT` edges are kept, vertex lines are skipped.

use crate::error::{Error, Result};
use crate::graph::{RelativePoseMeasurement, RobotMeasurements};
use crate::num::{Matrix3, Matrix6, NodeId, Number, Vector3, Vector6};
use crate::pose::{LieGroup, PoseWithCovariance};
use crate::slam2d::SE2;
use crate::slam3d::SE3Quat;

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use itertools::Itertools;
use std::fs;
use std::path::Path;

/// A pose group with a g2o edge representation.
pub trait G2oEdge<const D: usize>: LieGroup<D> {
    const EDGE_TAG: &'static str;
    /// Number of values after the two node ids.
    const NUM_VALUES: usize;

    fn from_values(values: &[Number], line: usize) -> Result<PoseWithCovariance<Self, D>>;

    /// `None` when the covariance has no information matrix.
    fn to_values(pose: &PoseWithCovariance<Self, D>) -> Option<Vec<Number>>;
}

impl G2oEdge<3> for SE2 {
    const EDGE_TAG: &'static str = "EDGE_SE2";
    const NUM_VALUES: usize = 3 + 6;

    fn from_values(v: &[Number], line: usize) -> Result<PoseWithCovariance<Self, 3>> {
        #[rustfmt::skip]
        let information = Matrix3::new(
            v[3], v[4], v[5],
            v[4], v[6], v[7],
            v[5], v[7], v[8],
        );
        let covariance = information
            .try_inverse()
            .ok_or(Error::SingularInformation { line })?;

        let pose = SE2::exp(&Vector3::new(v[0], v[1], v[2]));
        Ok(PoseWithCovariance::new(pose, covariance))
    }

    fn to_values(pose: &PoseWithCovariance<Self, 3>) -> Option<Vec<Number>> {
        let i = pose.covariance.try_inverse()?;
        let t = pose.pose.log();
        Some(vec![
            t.x,
            t.y,
            t.z,
            i[(0, 0)],
            i[(0, 1)],
            i[(0, 2)],
            i[(1, 1)],
            i[(1, 2)],
            i[(2, 2)],
        ])
    }
}

/// g2o measures rotation errors with the quaternion vector part, which is
/// half the rotation vector.
fn quaternion_to_rotation_vector() -> Matrix6 {
    Matrix6::from_diagonal(&Vector6::new(1.0, 1.0, 1.0, 2.0, 2.0, 2.0))
}

impl G2oEdge<6> for SE3Quat {
    const EDGE_TAG: &'static str = "EDGE_SE3:QUAT";
    const NUM_VALUES: usize = 7 + 21;

    fn from_values(v: &[Number], line: usize) -> Result<PoseWithCovariance<Self, 6>> {
        let mut information = Matrix6::zeros();
        let mut upper = v[7..].iter();
        for r in 0..6 {
            for c in r..6 {
                let value = *upper.next().ok_or(Error::Malformed {
                    line,
                    message: "truncated information matrix".to_owned(),
                })?;
                information[(r, c)] = value;
                information[(c, r)] = value;
            }
        }
        let jacobian = quaternion_to_rotation_vector();
        let covariance = jacobian
            * information
                .try_inverse()
                .ok_or(Error::SingularInformation { line })?
            * jacobian;

        let quaternion = Quaternion::new(v[6], v[3], v[4], v[5]);
        if quaternion.norm() < Number::EPSILON {
            return Err(Error::Malformed {
                line,
                message: "zero quaternion".to_owned(),
            });
        }
        let pose = Isometry3::from_parts(
            Translation3::new(v[0], v[1], v[2]),
            UnitQuaternion::from_quaternion(quaternion),
        );
        Ok(PoseWithCovariance::new(pose, covariance))
    }

    fn to_values(pose: &PoseWithCovariance<Self, 6>) -> Option<Vec<Number>> {
        let jacobian = quaternion_to_rotation_vector();
        let information = jacobian * pose.covariance.try_inverse()? * jacobian;

        let t = pose.pose.translation.vector;
        // i, j, k, w
        let q = pose.pose.rotation.quaternion().coords;

        let mut values = vec![t.x, t.y, t.z, q[0], q[1], q[2], q[3]];
        for r in 0..6 {
            for c in r..6 {
                values.push(information[(r, c)]);
            }
        }
        Some(values)
    }
}

/// Edges of a file, tagged by their dimension.
#[derive(Clone, Debug)]
pub enum PoseGraph {
    Planar(RobotMeasurements<SE2, 3>),
    Spatial(RobotMeasurements<SE3Quat, 6>),
}

impl PoseGraph {
    /// Number of degree of freedom of the measurements, 3 in 2D and 6 in 3D.
    pub fn dof(&self) -> usize {
        match self {
            PoseGraph::Planar(_) => 3,
            PoseGraph::Spatial(_) => 6,
        }
    }

    pub fn num_poses(&self) -> usize {
        match self {
            PoseGraph::Planar(measurements) => measurements.num_poses,
            PoseGraph::Spatial(measurements) => measurements.num_poses,
        }
    }
}

enum Edges {
    Planar(Vec<RelativePoseMeasurement<SE2, 3>>),
    Spatial(Vec<RelativePoseMeasurement<SE3Quat, 6>>),
}

impl Edges {
    fn dof(&self) -> usize {
        match self {
            Edges::Planar(_) => 3,
            Edges::Spatial(_) => 6,
        }
    }
}

/// Reads a `.g2o` file.
///
/// With `only_loop_closures`, every edge is a loop closure (files of
/// inter-robot measurements).
pub fn read_g2o_file<P: AsRef<Path>>(path: P, only_loop_closures: bool) -> Result<PoseGraph> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let graph =
        parse_g2o(&text, only_loop_closures)?.ok_or_else(|| Error::EmptyGraph(path.into()))?;
    log::debug!(
        "{}: {} poses, {}-dof measurements",
        path.display(),
        graph.num_poses(),
        graph.dof()
    );
    Ok(graph)
}

/// Parses the content of a `.g2o` file, `None` when it holds no edge.
pub fn parse_g2o(text: &str, only_loop_closures: bool) -> Result<Option<PoseGraph>> {
    let mut edges: Option<Edges> = None;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let mut tokens = line.split_whitespace();

        let token = match tokens.next() {
            Some(token) if !token.starts_with('#') => token,
            _ => continue,
        };

        match token {
            "EDGE_SE2" => {
                let edge = parse_edge::<SE2, 3>(tokens, line_number)?;
                match edges.get_or_insert_with(|| Edges::Planar(vec![])) {
                    Edges::Planar(planar) => planar.push(edge),
                    other => {
                        return Err(Error::DimensionMismatch {
                            expected: other.dof(),
                            found: 3,
                        })
                    }
                }
            }
            "EDGE_SE3:QUAT" => {
                let edge = parse_edge::<SE3Quat, 6>(tokens, line_number)?;
                match edges.get_or_insert_with(|| Edges::Spatial(vec![])) {
                    Edges::Spatial(spatial) => spatial.push(edge),
                    other => {
                        return Err(Error::DimensionMismatch {
                            expected: other.dof(),
                            found: 6,
                        })
                    }
                }
            }
            // This is just initialization information, so do nothing
            "VERTEX_SE2" | "VERTEX_SE3:QUAT" => continue,
            _ => {
                return Err(Error::UnknownEdgeType {
                    line: line_number,
                    token: token.to_owned(),
                })
            }
        }
    }

    Ok(edges.map(|edges| match edges {
        Edges::Planar(edges) => {
            PoseGraph::Planar(RobotMeasurements::from_edges(edges, only_loop_closures))
        }
        Edges::Spatial(edges) => {
            PoseGraph::Spatial(RobotMeasurements::from_edges(edges, only_loop_closures))
        }
    }))
}

fn parse_edge<'t, G, const D: usize>(
    mut tokens: impl Iterator<Item = &'t str>,
    line: usize,
) -> Result<RelativePoseMeasurement<G, D>>
where
    G: G2oEdge<D>,
{
    let malformed = |message: String| Error::Malformed { line, message };

    let mut next_id = |name: &str| -> Result<NodeId> {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(format!("missing pose id {}", name)))?;
        token
            .parse()
            .map_err(|_| malformed(format!("invalid pose id {} `{}`", name, token)))
    };
    let i = next_id("i")?;
    let j = next_id("j")?;
    if i == j {
        return Err(Error::SelfLoop { line, id: i });
    }

    let values = tokens
        .map(|token| {
            token
                .parse::<Number>()
                .map_err(|_| malformed(format!("invalid number `{}`", token)))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != G::NUM_VALUES {
        return Err(malformed(format!(
            "{} expects {} values, found {}",
            G::EDGE_TAG,
            G::NUM_VALUES,
            values.len()
        )));
    }

    let pose = G::from_values(&values, line)?;
    Ok(RelativePoseMeasurement::new(i, j, pose))
}

/// Formats edges in the `.g2o` format.
pub fn format_g2o<'m, G, const D: usize, I>(measurements: I) -> Result<String>
where
    G: G2oEdge<D>,
    I: IntoIterator<Item = &'m RelativePoseMeasurement<G, D>>,
{
    let mut text = String::new();
    for (index, measurement) in measurements.into_iter().enumerate() {
        let values = G::to_values(&measurement.pose)
            .ok_or(Error::SingularInformation { line: index + 1 })?;

        text.push_str(&format!(
            "{} {} {} {}\n",
            G::EDGE_TAG,
            measurement.i,
            measurement.j,
            values.iter().join(" ")
        ));
    }
    Ok(text)
}

/// Writes edges to a `.g2o` file.
pub fn write_g2o<'m, G, const D: usize, I, P>(path: P, measurements: I) -> Result<()>
where
    G: G2oEdge<D>,
    I: IntoIterator<Item = &'m RelativePoseMeasurement<G, D>>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = format_g2o(measurements)?;
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_trajectory;

    use approx::assert_relative_eq;

    const PLANAR: &str = "\
VERTEX_SE2 0 0 0 0
EDGE_SE2 0 1 1.0 0.0 0.0 100 0 0 100 0 400
EDGE_SE2 1 2 1.0 0.0 0.5 100 0 0 100 0 400

EDGE_SE2 2 0 -1.0 1.0 -0.5 10 0 0 10 0 40
";

    #[test]
    fn test_parse_planar() {
        let graph = parse_g2o(PLANAR, false).unwrap().unwrap();
        assert_eq!(graph.dof(), 3);
        assert_eq!(graph.num_poses(), 3);

        let measurements = match graph {
            PoseGraph::Planar(measurements) => measurements,
            _ => panic!("expected planar edges"),
        };
        assert_eq!(measurements.loop_closures, vec![(2, 0)]);

        let edge = measurements.transforms.get((1, 2)).unwrap();
        assert_relative_eq!(edge.pose.tangent(), Vector3::new(1.0, 0.0, 0.5), epsilon = 1e-12);
        assert_relative_eq!(edge.pose.covariance[(0, 0)], 0.01, epsilon = 1e-12);
        assert_relative_eq!(edge.pose.covariance[(2, 2)], 0.0025, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_spatial_rescales_rotation() {
        let text = "EDGE_SE3:QUAT 0 1 1 2 3 0 0 0 1 \
                    100 0 0 0 0 0 100 0 0 0 0 100 0 0 0 400 0 0 400 0 400\n";
        let graph = parse_g2o(text, false).unwrap().unwrap();
        let measurements = match graph {
            PoseGraph::Spatial(measurements) => measurements,
            _ => panic!("expected spatial edges"),
        };

        let edge = measurements.transforms.get((0, 1)).unwrap();
        assert_relative_eq!(edge.pose.covariance[(0, 0)], 0.01, epsilon = 1e-12);
        // quaternion variance 1/400, rotation vector variance 4/400
        assert_relative_eq!(edge.pose.covariance[(3, 3)], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_edge_type() {
        let err = parse_g2o("EDGE_SE2_XY 0 1 1 2 1 0 1\n", false).unwrap_err();
        assert!(matches!(err, Error::UnknownEdgeType { line: 1, .. }));
    }

    #[test]
    fn test_mixed_dimensions() {
        let text = "EDGE_SE2 0 1 1 0 0 1 0 0 1 0 1\n\
                    EDGE_SE3:QUAT 1 2 0 0 0 0 0 0 1 1 0 0 0 0 0 1 0 0 0 0 1 0 0 0 1 0 0 1 0 1\n";
        let err = parse_g2o(text, false).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, found: 6 }));
    }

    #[test]
    fn test_malformed_edges() {
        assert!(matches!(
            parse_g2o("EDGE_SE2 0 1 1 0\n", false),
            Err(Error::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse_g2o("EDGE_SE2 3 3 1 0 0 1 0 0 1 0 1\n", false),
            Err(Error::SelfLoop { id: 3, .. })
        ));
        assert!(matches!(
            parse_g2o("EDGE_SE2 0 1 1 0 0 0 0 0 0 0 0\n", false),
            Err(Error::SingularInformation { line: 1 })
        ));
        assert!(parse_g2o("VERTEX_SE2 0 0 0 0\n", false).unwrap().is_none());
    }

    #[test]
    fn test_format_reads_back() {
        let graph = parse_g2o(PLANAR, false).unwrap().unwrap();
        let measurements = match graph {
            PoseGraph::Planar(measurements) => measurements,
            _ => panic!("expected planar edges"),
        };

        let text = format_g2o(measurements.transforms.iter()).unwrap();
        let reread = match parse_g2o(&text, false).unwrap().unwrap() {
            PoseGraph::Planar(measurements) => measurements,
            _ => panic!("expected planar edges"),
        };

        assert_eq!(reread.loop_closures, measurements.loop_closures);
        for (edge, reread_edge) in measurements.transforms.iter().zip(reread.transforms.iter()) {
            assert_eq!(edge.key(), reread_edge.key());
            assert_relative_eq!(edge.pose.tangent(), reread_edge.pose.tangent(), epsilon = 1e-9);
            assert_relative_eq!(edge.pose.covariance, reread_edge.pose.covariance, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_written_loop_closure_stays_loop_closure() {
        let text = "EDGE_SE2 0 1 1 0 0 1 0 0 1 0 1\n\
                    EDGE_SE2 1 2 1 0 0 1 0 0 1 0 1\n\
                    EDGE_SE2 2 3 1 0 0 1 0 0 1 0 1\n\
                    EDGE_SE2 0 3 3 0 0 1 0 0 1 0 1\n";
        let planar = |text: &str| match parse_g2o(text, false).unwrap().unwrap() {
            PoseGraph::Planar(measurements) => measurements,
            _ => panic!("expected planar edges"),
        };

        let measurements = planar(text);
        assert_eq!(measurements.loop_closures, vec![(0, 3)]);

        let reread = planar(&format_g2o(measurements.transforms.iter()).unwrap());
        assert_eq!(reread.loop_closures, vec![(0, 3)]);
        assert_eq!(
            reread.transforms.iter().map(|t| t.key()).collect::<Vec<_>>(),
            vec![(0, 1), (1, 2), (2, 3), (0, 3)]
        );
        assert_eq!(build_trajectory(&reread.transforms).end_id, 3);
    }
}
