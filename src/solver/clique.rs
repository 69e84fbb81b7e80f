use super::base::Solver;
use crate::graph::ConsistencyGraph;

/// Exact maximum clique by branch and bound.
///
/// Vertices whose degree cannot beat the best clique found so far are pruned
/// (Pattabiraman et al., "Fast Algorithms for the Maximum Clique Problem on
/// Massive Graphs", 2015). The budget caps the number of branch expansions;
/// when it runs out the best clique found so far is returned.
pub struct MaxCliqueSolver<'a> {
    pub graph: &'a ConsistencyGraph,
    /// Only cliques strictly larger than this are searched for.
    pub lower_bound: usize,
}

/// Greedy maximum clique.
///
/// From every admissible seed, repeatedly adds the candidate of highest
/// degree. The budget caps the number of seeds.
pub struct MaxCliqueHeuristic<'a> {
    pub graph: &'a ConsistencyGraph,
}

struct Search<'a> {
    graph: &'a ConsistencyGraph,
    budget: usize,
    max_clique: usize,
    best: Vec<usize>,
    current: Vec<usize>,
    is_exhausted: bool,
}

impl<'a> Solver<Vec<usize>> for MaxCliqueSolver<'a> {
    /// 1-based vertices of the clique, sorted.
    fn solve(self, budget: usize) -> Vec<usize> {
        let graph = self.graph;
        let mut search = Search {
            graph,
            budget,
            max_clique: self.lower_bound,
            best: vec![],
            current: vec![],
            is_exhausted: false,
        };

        for vertex in 0..graph.num_vertices() {
            if search.budget == 0 {
                search.is_exhausted = true;
                break;
            }
            if graph.degree(vertex) + 1 <= search.max_clique {
                continue;
            }

            let candidates = graph
                .neighbors(vertex)
                .iter()
                .copied()
                .filter(|&w| w > vertex && graph.degree(w) >= search.max_clique)
                .collect();

            search.current.push(vertex);
            search.expand(candidates);
            search.current.pop();
        }

        if search.is_exhausted {
            log::warn!(
                "Maximum clique search stopped early, the clique of {} vertices may not be maximum",
                search.best.len()
            );
        }
        into_one_based(search.best)
    }
}

impl<'a> Search<'a> {
    fn expand(&mut self, mut candidates: Vec<usize>) {
        // out of budget, the vertices taken so far still form a clique
        if self.budget == 0 {
            self.is_exhausted = true;
            self.record();
            return;
        }
        self.budget -= 1;

        if candidates.is_empty() {
            self.record();
            return;
        }

        while let Some(vertex) = candidates.pop() {
            // even taking every remaining candidate cannot beat the best
            if self.current.len() + candidates.len() + 1 <= self.max_clique {
                return;
            }

            let graph = self.graph;
            let max_clique = self.max_clique;
            let next = candidates
                .iter()
                .copied()
                .filter(|&w| graph.is_adjacent(vertex, w) && graph.degree(w) >= max_clique)
                .collect();

            self.current.push(vertex);
            self.expand(next);
            self.current.pop();
        }
    }

    fn record(&mut self) {
        if self.current.len() > self.max_clique {
            self.max_clique = self.current.len();
            self.best = self.current.clone();
        }
    }
}

impl<'a> Solver<Vec<usize>> for MaxCliqueHeuristic<'a> {
    /// 1-based vertices of the clique, sorted.
    fn solve(self, budget: usize) -> Vec<usize> {
        let graph = self.graph;
        let mut best: Vec<usize> = vec![];

        // seeds by decreasing degree
        let mut seeds: Vec<usize> = (0..graph.num_vertices()).collect();
        seeds.sort_by_key(|&v| std::cmp::Reverse(graph.degree(v)));

        for &seed in seeds.iter().take(budget) {
            if graph.degree(seed) + 1 <= best.len() {
                continue;
            }

            let mut clique = vec![seed];
            let mut candidates: Vec<usize> = graph
                .neighbors(seed)
                .iter()
                .copied()
                .filter(|&w| graph.degree(w) >= best.len())
                .collect();

            loop {
                let index = match candidates
                    .iter()
                    .enumerate()
                    .max_by_key(|&(_, &w)| graph.degree(w))
                {
                    Some((index, _)) => index,
                    None => break,
                };
                let vertex = candidates.swap_remove(index);
                clique.push(vertex);
                candidates.retain(|&w| graph.is_adjacent(vertex, w));
            }

            if clique.len() > best.len() {
                best = clique;
            }
        }

        into_one_based(best)
    }
}

#[inline]
fn into_one_based(mut clique: Vec<usize>) -> Vec<usize> {
    clique.sort_unstable();
    clique.into_iter().map(|v| v + 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(num_vertices: usize, edges: &[(usize, usize)]) -> ConsistencyGraph {
        ConsistencyGraph::from_edges(num_vertices, edges.iter().copied()).unwrap()
    }

    #[test]
    fn test_exact_finds_maximum_clique() {
        // 4-clique {2, 3, 5, 6} plus a triangle {1, 2, 4}
        let graph = graph(
            7,
            &[(1, 2), (1, 4), (2, 4), (2, 3), (2, 5), (2, 6), (3, 5), (3, 6), (5, 6), (6, 7)],
        );
        let clique = MaxCliqueSolver {
            graph: &graph,
            lower_bound: 0,
        }
        .solve_to_end();

        assert_eq!(clique, vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_heuristic_finds_clique() {
        let graph = graph(5, &[(1, 2), (1, 3), (2, 3), (4, 5)]);
        let clique = MaxCliqueHeuristic { graph: &graph }.solve_to_end();

        assert_eq!(clique, vec![1, 2, 3]);
    }

    #[test]
    fn test_edgeless_graph_returns_single_vertex() {
        let graph = graph(3, &[]);
        let clique = MaxCliqueSolver {
            graph: &graph,
            lower_bound: 0,
        }
        .solve_to_end();

        assert_eq!(clique, vec![1]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = ConsistencyGraph::default();
        assert!(MaxCliqueSolver { graph: &graph, lower_bound: 0 }.solve_to_end().is_empty());
        assert!(MaxCliqueHeuristic { graph: &graph }.solve_to_end().is_empty());
    }

    #[test]
    fn test_lower_bound_excludes_small_cliques() {
        let graph = graph(4, &[(1, 2), (2, 3), (1, 3), (3, 4)]);
        let clique = MaxCliqueSolver {
            graph: &graph,
            lower_bound: 3,
        }
        .solve_to_end();

        assert!(clique.is_empty());
    }

    #[test]
    fn test_exhausted_budget_keeps_partial_clique() {
        let graph = graph(3, &[(1, 2), (1, 3), (2, 3)]);
        let solver = |budget| {
            MaxCliqueSolver {
                graph: &graph,
                lower_bound: 0,
            }
            .solve(budget)
        };

        let clique = solver(1);
        assert_eq!(clique.len(), 2);
        assert!(graph.is_adjacent(clique[0] - 1, clique[1] - 1));

        assert_eq!(solver(2), vec![1, 2, 3]);
        assert!(solver(0).is_empty());
    }
}
