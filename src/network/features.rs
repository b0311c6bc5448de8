use serde::{Deserialize, Serialize};

use crate::network::centrality::{
    authority_score, betweenness, closeness, component_sizes, diameter, eigenvector_centrality,
    local_transitivity, pagerank, triangles,
};
use crate::network::graph::SimilarityGraph;

const GRAPH_PROPERTIES: [&str; 8] = [
    "largest_component",
    "one_core",
    "max_k_core",
    "clique",
    "assortativity",
    "n_component",
    "transitivity",
    "density",
];

const LOCAL_PROPERTIES: [&str; 6] = [
    "degree",
    "component_size",
    "transitivity",
    "authority",
    "pagerank",
    "eigenvector",
];

const EXTENDED_LOCAL_PROPERTIES: [&str; 2] = ["betweenness", "closeness"];

/// Which graph statistics make up the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSet {
    /// 8 graph-level values, then mean and variance of 6 vertex-level properties
    #[default]
    Standard,
    /// Standard plus diameter, betweenness and closeness
    Extended,
}

impl FeatureSet {
    fn graph_properties(self) -> Vec<&'static str> {
        let mut names = GRAPH_PROPERTIES.to_vec();
        if self == Self::Extended {
            names.push("diameter");
        }
        names
    }

    fn local_properties(self) -> Vec<&'static str> {
        let mut names = LOCAL_PROPERTIES.to_vec();
        if self == Self::Extended {
            names.extend(EXTENDED_LOCAL_PROPERTIES);
        }
        names
    }

    /// Feature names in vector order
    #[must_use]
    pub fn feature_names(self) -> Vec<String> {
        let local = self.local_properties();
        self.graph_properties()
            .into_iter()
            .map(str::to_string)
            .chain(local.iter().map(|p| format!("avg_{p}")))
            .chain(local.iter().map(|p| format!("var_{p}")))
            .collect()
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.graph_properties().len() + 2 * self.local_properties().len()
    }
}

/// Named feature vector of one graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkFeatures {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl NetworkFeatures {
    /// Value of a named feature
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Compute the feature vector of `graph`.
///
/// Percent-valued features are on a 0-100 scale. Undefined scalars (empty graph,
/// assortativity of a regular graph, transitivity without connected triples) are 0,
/// and undefined vertex values are left out of means and variances, so every value
/// is finite.
#[must_use]
pub fn compute_features(graph: &SimilarityGraph, feature_set: FeatureSet) -> NetworkFeatures {
    let names = feature_set.feature_names();
    let n = graph.vertex_count();
    if n == 0 {
        let values = vec![0.0; names.len()];
        return NetworkFeatures { names, values };
    }

    let adjacency = graph.adjacency();
    let nf = to_f64(n);
    let degrees: Vec<usize> = adjacency.iter().map(Vec::len).collect();
    let sizes = component_sizes(&adjacency);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);

    let mut values = vec![
        100.0 * to_f64(sizes.iter().copied().max().unwrap_or(0)) / nf,
        100.0 * to_f64(degrees.iter().filter(|&&d| d > 0).count()) / nf,
        100.0 * to_f64(degrees.iter().filter(|&&d| d == max_degree).count()) / nf,
        100.0 * to_f64(clique_number(&adjacency)) / nf,
        degree_assortativity(graph, &degrees),
        to_f64(sizes.len()),
        global_transitivity(&adjacency, &degrees),
        100.0 * density(n, graph.edge_count()),
    ];
    if feature_set == FeatureSet::Extended {
        values.push(100.0 * to_f64(diameter(&adjacency)) / nf);
    }

    let mut local: Vec<Vec<f64>> = vec![
        degrees.iter().copied().map(to_f64).collect(),
        sizes.iter().copied().map(to_f64).collect(),
        local_transitivity(&adjacency),
        authority_score(&adjacency),
        pagerank(&adjacency),
        eigenvector_centrality(&adjacency),
    ];
    if feature_set == FeatureSet::Extended {
        local.push(betweenness(&adjacency));
        local.push(closeness(&adjacency));
    }

    let stats: Vec<(f64, f64)> = local.iter().map(|v| mean_and_variance(v)).collect();
    values.extend(stats.iter().map(|(mean, _)| *mean));
    values.extend(stats.iter().map(|(_, variance)| *variance));

    NetworkFeatures { names, values }
}

/// Size of the largest clique (Bron-Kerbosch with pivoting)
#[must_use]
pub fn clique_number(adjacency: &[Vec<usize>]) -> usize {
    if adjacency.is_empty() {
        return 0;
    }
    let mut best = 1;
    let candidates: Vec<usize> = (0..adjacency.len()).collect();
    bron_kerbosch(adjacency, 0, candidates, Vec::new(), &mut best);
    best
}

fn bron_kerbosch(
    adjacency: &[Vec<usize>],
    size: usize,
    mut candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    best: &mut usize,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            *best = (*best).max(size);
        }
        return;
    }
    if size + candidates.len() <= *best {
        return;
    }

    let adjacent = |a: usize, b: usize| adjacency[a].binary_search(&b).is_ok();
    let pivot = candidates
        .iter()
        .chain(&excluded)
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|&&v| adjacent(u, v)).count())
        .unwrap_or(candidates[0]);

    let branches: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&v| !adjacent(pivot, v))
        .collect();
    for v in branches {
        let next_candidates = candidates.iter().copied().filter(|&w| adjacent(v, w)).collect();
        let next_excluded = excluded.iter().copied().filter(|&w| adjacent(v, w)).collect();
        bron_kerbosch(adjacency, size + 1, next_candidates, next_excluded, best);
        candidates.retain(|&w| w != v);
        excluded.push(v);
    }
}

/// Pearson correlation of the degrees at either end of each edge; 0 when undefined
fn degree_assortativity(graph: &SimilarityGraph, degrees: &[usize]) -> f64 {
    let m = graph.edge_count();
    if m == 0 {
        return 0.0;
    }
    let (mut product, mut sum, mut squares) = (0.0, 0.0, 0.0);
    for (a, b) in graph.edges() {
        let (j, k) = (to_f64(degrees[a]), to_f64(degrees[b]));
        product += j * k;
        sum += (j + k) / 2.0;
        squares += (j * j + k * k) / 2.0;
    }
    let mf = to_f64(m);
    let mean = sum / mf;
    let denominator = squares / mf - mean * mean;
    if denominator.abs() < 1e-12 {
        0.0
    } else {
        (product / mf - mean * mean) / denominator
    }
}

/// Ratio of closed to connected triples; 0 when there are no triples
fn global_transitivity(adjacency: &[Vec<usize>], degrees: &[usize]) -> f64 {
    let closed: usize = triangles(adjacency).iter().sum();
    let triples: usize = degrees.iter().map(|&k| k * k.saturating_sub(1) / 2).sum();
    if triples == 0 {
        0.0
    } else {
        to_f64(closed) / to_f64(triples)
    }
}

fn density(n: usize, edges: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        to_f64(2 * edges) / to_f64(n * (n - 1))
    }
}

/// Mean and population variance of the non-NaN values; (0, 0) if there are none
fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() {
        return (0.0, 0.0);
    }
    let n = to_f64(defined.len());
    let mean = defined.iter().sum::<f64>() / n;
    let variance = defined.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

#[inline]
fn to_f64(value: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        value as f64
    }
}
