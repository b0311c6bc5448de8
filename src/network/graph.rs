use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

use crate::index::DeletionIndex;
use crate::network::NetworkError;

/// Undirected, simple similarity graph over distinct sequence strings.
///
/// Vertex `i` is the `i`-th distinct string in first-seen order; an edge joins two
/// strings within the construction edit distance.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    graph: UnGraph<String, ()>,
}

impl SimilarityGraph {
    /// Build the graph over the distinct values of `strings`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Index` if the index rejects a lookup.
    pub fn construct<I, S>(strings: I, max_edit_distance: u32) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = DeletionIndex::build(strings, max_edit_distance);

        let mut graph = UnGraph::with_capacity(index.len(), index.len());
        let mut vertices: HashMap<&str, NodeIndex> = HashMap::with_capacity(index.len());
        for string in index.strings() {
            vertices.insert(string.as_str(), graph.add_node(string.clone()));
        }

        for (i, string) in index.strings().iter().enumerate() {
            let source = NodeIndex::new(i);
            for neighbor in index.lookup(string, max_edit_distance)? {
                // Each pair is found from both ends; keep one edge and no self-loops
                if let Some(&target) = vertices.get(neighbor) {
                    if source < target {
                        graph.add_edge(source, target, ());
                    }
                }
            }
        }

        Ok(Self { graph })
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The sequence string of a vertex
    #[must_use]
    pub fn sequence(&self, vertex: usize) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(vertex))
            .map(String::as_str)
    }

    /// Sorted neighbour lists, one per vertex
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.vertex_count()];
        for edge in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                adjacency[a.index()].push(b.index());
                adjacency[b.index()].push(a.index());
            }
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }
        adjacency
    }

    /// Both endpoints of every edge, smaller vertex first
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| (a.index().min(b.index()), a.index().max(b.index())))
    }

    #[must_use]
    pub fn graph(&self) -> &UnGraph<String, ()> {
        &self.graph
    }
}
