//! Error types for pairwise consistency maximization

use crate::num::NodeId;

use std::path::PathBuf;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// PCM error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Measurement or result file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Edge type token that is neither a planar nor a spatial edge
    #[error("line {line}: unrecognized edge type `{token}`")]
    UnknownEdgeType { line: usize, token: String },

    /// Edge line with missing or unparsable fields
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Edge connecting a node to itself
    #[error("line {line}: edge connects node {id} to itself")]
    SelfLoop { line: usize, id: NodeId },

    /// Information matrix that cannot be inverted into a covariance
    #[error("line {line}: singular information matrix")]
    SingularInformation { line: usize },

    /// Measurement file without any edge
    #[error("no edge found in {0}")]
    EmptyGraph(PathBuf),

    /// 3-dof and 6-dof measurements mixed in one computation
    #[error("dimension mismatch: expected {expected}-dof measurements, found {found}-dof")]
    DimensionMismatch { expected: usize, found: usize },

    /// Node id outside the composed trajectory
    #[error("node {id} is not on the trajectory [{start_id}, {end_id}]")]
    NodeNotInTrajectory {
        id: NodeId,
        start_id: NodeId,
        end_id: NodeId,
    },

    /// Loop closure without a matching inter-robot measurement
    #[error("no measurement for edge ({0}, {1})")]
    MissingMeasurement(NodeId, NodeId),

    /// Clique vertex that does not index the loop-closure list
    #[error("clique vertex {index} out of range (1..={len})")]
    CliqueIndexOutOfRange { index: usize, len: usize },

    /// Chi-squared threshold that cannot separate anything
    #[error("invalid consistency threshold: {0}")]
    InvalidThreshold(f64),

    /// Malformed consistency graph file
    #[error("invalid consistency graph: {0}")]
    InvalidGraph(String),

    /// Unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
