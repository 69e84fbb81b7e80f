//! Consistency graph in the Matrix Market coordinate format, as read by
//! maximum clique finders, and the export of the retained loop closures.

use crate::error::{Error, Result};
use crate::graph::{ConsistencyGraph, ConsistencyMatrix};
use crate::num::NodeId;

use std::fs;
use std::path::Path;

const HEADER: &str = "%%MatrixMarket matrix coordinate pattern symmetric";

/// Formats the consistent pairs of the upper triangle, 1-based.
pub fn format_consistency_graph(consistency_matrix: &ConsistencyMatrix) -> String {
    let n = consistency_matrix.len();
    let mut text = format!("{}\n{} {} {}\n", HEADER, n, n, consistency_matrix.num_edges());
    for (u, v) in consistency_matrix.edges() {
        text.push_str(&format!("{} {}\n", u + 1, v + 1));
    }
    text
}

pub fn write_consistency_graph<P: AsRef<Path>>(
    consistency_matrix: &ConsistencyMatrix,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_consistency_graph(consistency_matrix)).map_err(|e| Error::io(path, e))
}

/// Parses a symmetric pattern matrix into a graph.
pub fn parse_consistency_graph(text: &str) -> Result<ConsistencyGraph> {
    let invalid = |message: String| Error::InvalidGraph(message);

    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    match lines.next() {
        Some(header) if header.starts_with("%%MatrixMarket") => {
            if !header.contains("pattern") || !header.contains("symmetric") {
                return Err(invalid(format!("unsupported matrix type `{}`", header)));
            }
        }
        _ => return Err(invalid("missing Matrix Market header".to_owned())),
    }

    let mut lines = lines.filter(|line| !line.starts_with('%'));
    let parse_pair = |line: &str| -> Result<Vec<usize>> {
        line.split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| invalid(format!("invalid integer `{}`", token)))
            })
            .collect()
    };

    let size = lines
        .next()
        .ok_or_else(|| invalid("missing dimensions line".to_owned()))?;
    let (rows, cols, nnz) = match parse_pair(size)?.as_slice() {
        &[rows, cols, nnz] => (rows, cols, nnz),
        _ => return Err(invalid(format!("invalid dimensions line `{}`", size))),
    };
    if rows != cols {
        return Err(invalid(format!("non-square matrix {}x{}", rows, cols)));
    }

    let edges = lines
        .map(|line| -> Result<(usize, usize)> {
            match parse_pair(line)?.as_slice() {
                &[row, col] => Ok((row, col)),
                _ => Err(invalid(format!("invalid entry `{}`", line))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if edges.len() != nnz {
        return Err(invalid(format!(
            "{} entries announced, {} found",
            nnz,
            edges.len()
        )));
    }

    ConsistencyGraph::from_edges(rows, edges)
}

pub fn read_consistency_graph<P: AsRef<Path>>(path: P) -> Result<ConsistencyGraph> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_consistency_graph(&text)
}

/// One `i j` line per loop closure.
pub fn format_loop_closures(loop_closures: &[(NodeId, NodeId)]) -> String {
    loop_closures
        .iter()
        .map(|(i, j)| format!("{} {}\n", i, j))
        .collect()
}

pub fn write_loop_closures<P: AsRef<Path>>(
    loop_closures: &[(NodeId, NodeId)],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_loop_closures(loop_closures)).map_err(|e| Error::io(path, e))
}
