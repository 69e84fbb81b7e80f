use crate::error::{Error, Result};

use nalgebra::DMatrix;

/// Pairwise consistency of the loop closures.
///
/// Only the strict upper triangle is evaluated; untested cells stay at 0.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsistencyMatrix {
    matrix: DMatrix<u8>,
}

impl ConsistencyMatrix {
    pub fn zeros(num_loop_closures: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(num_loop_closures, num_loop_closures),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn set(&mut self, u: usize, v: usize, is_consistent: bool) {
        self.matrix[(u, v)] = is_consistent as u8;
    }

    #[inline]
    pub fn is_consistent(&self, u: usize, v: usize) -> bool {
        self.matrix[(u, v)] == 1
    }

    /// Consistent pairs `(u, v)` with `u <= v`, row by row.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.len();
        (0..n)
            .flat_map(move |u| (u..n).map(move |v| (u, v)))
            .filter(move |&(u, v)| self.is_consistent(u, v))
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges().count()
    }

    /// Full symmetric adjacency, the upper triangle mirrored below the diagonal.
    pub fn symmetric(&self) -> DMatrix<u8> {
        let mut matrix = self.matrix.clone();
        matrix.fill_lower_triangle_with_upper_triangle();
        matrix
    }

    #[inline]
    pub fn as_matrix(&self) -> &DMatrix<u8> {
        &self.matrix
    }
}

/// Undirected graph over loop closures, as consumed by the clique solvers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsistencyGraph {
    num_vertices: usize,
    // 0-based, sorted
    adjacency: Vec<Vec<usize>>,
}

impl ConsistencyGraph {
    /// Builds the graph from 1-based `(row, col)` pairs. Diagonal entries are
    /// ignored.
    pub fn from_edges<I>(num_vertices: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency = vec![vec![]; num_vertices];
        for (row, col) in edges {
            if row == 0 || col == 0 || row > num_vertices || col > num_vertices {
                return Err(Error::InvalidGraph(format!(
                    "edge ({}, {}) outside 1..={}",
                    row, col, num_vertices
                )));
            }
            if row == col {
                continue;
            }
            adjacency[row - 1].push(col - 1);
            adjacency[col - 1].push(row - 1);
        }

        for neighbors in adjacency.iter_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        Ok(Self {
            num_vertices,
            adjacency,
        })
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    #[inline]
    pub fn degree(&self, vertex: usize) -> usize {
        self.adjacency[vertex].len()
    }

    #[inline]
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.adjacency[vertex]
    }

    #[inline]
    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&b).is_ok()
    }

    #[inline]
    pub fn max_degree(&self) -> usize {
        (0..self.num_vertices)
            .map(|v| self.degree(v))
            .max()
            .unwrap_or(0)
    }

    /// Edges as 1-based `(row, col)` pairs with `row < col`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, neighbors)| {
            neighbors
                .iter()
                .filter(move |&&b| a < b)
                .map(move |&b| (a + 1, b + 1))
        })
    }
}

impl From<&ConsistencyMatrix> for ConsistencyGraph {
    fn from(matrix: &ConsistencyMatrix) -> Self {
        let mut adjacency = vec![vec![]; matrix.len()];
        for (u, v) in matrix.edges().filter(|(u, v)| u != v) {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        for neighbors in adjacency.iter_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        Self {
            num_vertices: matrix.len(),
            adjacency,
        }
    }
}
