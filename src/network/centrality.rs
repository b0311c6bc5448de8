//! Vertex-level graph statistics over neighbour lists.
//!
//! All functions take the adjacency of a simple undirected graph as sorted neighbour
//! lists (see [`SimilarityGraph::adjacency`](crate::network::SimilarityGraph::adjacency)).

use petgraph::unionfind::UnionFind;
use std::collections::VecDeque;

const DAMPING: f64 = 0.85;
const TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 1000;

/// Sizes of the connected components, in order of each component's first vertex
#[must_use]
pub fn component_sizes(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    let mut components = UnionFind::new(n);
    for (v, neighbors) in adjacency.iter().enumerate() {
        for &u in neighbors {
            components.union(v, u);
        }
    }

    let labels = components.into_labeling();
    let mut slot = vec![usize::MAX; n];
    let mut sizes = Vec::new();
    for label in labels {
        if slot[label] == usize::MAX {
            slot[label] = sizes.len();
            sizes.push(0);
        }
        sizes[slot[label]] += 1;
    }
    sizes
}

/// Number of triangles each vertex takes part in
#[must_use]
pub fn triangles(adjacency: &[Vec<usize>]) -> Vec<usize> {
    adjacency
        .iter()
        .map(|neighbors| {
            let mut count = 0;
            for (i, &a) in neighbors.iter().enumerate() {
                for &b in &neighbors[i + 1..] {
                    if adjacency[a].binary_search(&b).is_ok() {
                        count += 1;
                    }
                }
            }
            count
        })
        .collect()
}

/// Local clustering coefficient; `NaN` for vertices with fewer than two neighbours
#[must_use]
pub fn local_transitivity(adjacency: &[Vec<usize>]) -> Vec<f64> {
    triangles(adjacency)
        .into_iter()
        .zip(adjacency)
        .map(|(t, neighbors)| {
            let k = neighbors.len();
            if k < 2 {
                f64::NAN
            } else {
                to_f64(t) / to_f64(k * (k - 1) / 2)
            }
        })
        .collect()
}

/// PageRank with damping 0.85; rank of dangling vertices is spread uniformly
#[must_use]
pub fn pagerank(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    if n == 0 {
        return Vec::new();
    }
    let uniform = 1.0 / to_f64(n);
    let mut rank = vec![uniform; n];

    for _ in 0..MAX_ITERATIONS {
        let dangling: f64 = adjacency
            .iter()
            .zip(&rank)
            .filter(|(neighbors, _)| neighbors.is_empty())
            .map(|(_, r)| r)
            .sum();
        let base = (1.0 - DAMPING) * uniform + DAMPING * dangling * uniform;

        let mut next = vec![base; n];
        for (v, neighbors) in adjacency.iter().enumerate() {
            if neighbors.is_empty() {
                continue;
            }
            let share = DAMPING * rank[v] / to_f64(neighbors.len());
            for &u in neighbors {
                next[u] += share;
            }
        }

        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < TOLERANCE {
            break;
        }
    }
    rank
}

/// Eigenvector centrality scaled so the maximum is 1; all ones for a graph without edges
#[must_use]
pub fn eigenvector_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    if adjacency.iter().all(Vec::is_empty) {
        return vec![1.0; adjacency.len()];
    }
    // Iterating with A + I shares A's dominant eigenvector and does not oscillate on
    // bipartite components
    power_iteration(adjacency, |x| {
        adjacency
            .iter()
            .enumerate()
            .map(|(v, neighbors)| x[v] + neighbors.iter().map(|&u| x[u]).sum::<f64>())
            .collect()
    })
}

/// HITS authority score scaled so the maximum is 1; all ones for a graph without edges
///
/// For an undirected graph this is the dominant eigenvector of `A²`.
#[must_use]
pub fn authority_score(adjacency: &[Vec<usize>]) -> Vec<f64> {
    if adjacency.iter().all(Vec::is_empty) {
        return vec![1.0; adjacency.len()];
    }
    let multiply = |x: &[f64]| -> Vec<f64> {
        adjacency
            .iter()
            .map(|neighbors| neighbors.iter().map(|&u| x[u]).sum())
            .collect()
    };
    power_iteration(adjacency, |x| multiply(&multiply(x)))
}

fn power_iteration<F>(adjacency: &[Vec<usize>], step: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut x: Vec<f64> = adjacency.iter().map(|n| to_f64(n.len())).collect();
    scale_to_unit_max(&mut x);

    for _ in 0..MAX_ITERATIONS {
        let mut next = step(&x);
        scale_to_unit_max(&mut next);
        let delta = next
            .iter()
            .zip(&x)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        x = next;
        if delta < TOLERANCE {
            break;
        }
    }
    x
}

fn scale_to_unit_max(x: &mut [f64]) {
    let max = x.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for value in x.iter_mut() {
            *value /= max;
        }
    }
}

/// Hop distances from `source`; `None` for unreachable vertices
#[must_use]
pub fn bfs_distances(adjacency: &[Vec<usize>], source: usize) -> Vec<Option<usize>> {
    let mut distances = vec![None; adjacency.len()];
    let mut queue = VecDeque::from([source]);
    distances[source] = Some(0);
    while let Some(v) = queue.pop_front() {
        let next = distances[v].map_or(0, |d| d + 1);
        for &u in &adjacency[v] {
            if distances[u].is_none() {
                distances[u] = Some(next);
                queue.push_back(u);
            }
        }
    }
    distances
}

/// Longest finite shortest path
#[must_use]
pub fn diameter(adjacency: &[Vec<usize>]) -> usize {
    (0..adjacency.len())
        .flat_map(|v| bfs_distances(adjacency, v).into_iter().flatten())
        .max()
        .unwrap_or(0)
}

/// Closeness over the reachable set, normalised: `(r - 1) / Σ d` where `r` counts the
/// reachable vertices including the source. `NaN` for isolated vertices.
#[must_use]
pub fn closeness(adjacency: &[Vec<usize>]) -> Vec<f64> {
    (0..adjacency.len())
        .map(|v| {
            let reachable: Vec<usize> = bfs_distances(adjacency, v).into_iter().flatten().collect();
            let total: usize = reachable.iter().sum();
            if total == 0 {
                f64::NAN
            } else {
                to_f64(reachable.len() - 1) / to_f64(total)
            }
        })
        .collect()
}

/// Betweenness normalised by `(N-1)(N-2)/2` (Brandes' algorithm); zero when `N < 3`
#[must_use]
pub fn betweenness(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    if n < 3 {
        return vec![0.0; n];
    }

    let mut centrality = vec![0.0; n];
    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut paths = vec![0.0_f64; n];
        let mut distance: Vec<Option<usize>> = vec![None; n];
        paths[source] = 1.0;
        distance[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let next = distance[v].map_or(0, |d| d + 1);
            for &w in &adjacency[v] {
                if distance[w].is_none() {
                    distance[w] = Some(next);
                    queue.push_back(w);
                }
                if distance[w] == Some(next) {
                    paths[w] += paths[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut dependency = vec![0.0; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                dependency[v] += paths[v] / paths[w] * (1.0 + dependency[w]);
            }
            if w != source {
                centrality[w] += dependency[w];
            }
        }
    }

    // Every unordered pair was counted from both ends
    let scale = to_f64((n - 1) * (n - 2));
    centrality.iter().map(|c| c / scale).collect()
}

#[inline]
fn to_f64(value: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        value as f64
    }
}
