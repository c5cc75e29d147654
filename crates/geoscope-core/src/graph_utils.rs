use crate::weights::{SpatialWeights, UnitKey};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Summary statistics of a weights graph (the pysal `W` summary: cardinality range, sparsity, components).
#[derive(Debug, Clone, Serialize)]
pub struct WeightsStats {
    pub unit_count: usize,
    pub link_count: usize,
    pub islands: usize,
    pub components: usize,
    pub min_neighbors: usize,
    pub mean_neighbors: f64,
    pub max_neighbors: usize,
    /// Share of non-zero cells in the full n x n matrix, in percent
    pub pct_nonzero: f64,
}

/// Component membership of every unit.
#[derive(Debug, Clone)]
pub struct ComponentAssignment {
    /// Component label per unit index
    pub labels: Vec<usize>,
    /// Unit count per component label
    pub sizes: Vec<usize>,
}

/// Undirected view of the weights graph; a link in either direction connects two units.
pub fn to_undirected_graph<K: UnitKey>(weights: &SpatialWeights<K>) -> UnGraph<(), f64> {
    let mut graph = UnGraph::with_capacity(weights.len(), weights.link_count());
    let nodes: Vec<NodeIndex> = (0..weights.len()).map(|_| graph.add_node(())).collect();
    for (i, j, w) in weights.links() {
        if i < j || weights.weight(j, i) == 0.0 {
            graph.add_edge(nodes[i], nodes[j], w);
        }
    }
    graph
}

/// Calculates cardinality statistics and the number of connected components.
pub fn weights_stats<K: UnitKey>(weights: &SpatialWeights<K>) -> WeightsStats {
    let n = weights.len();
    let cardinalities: Vec<usize> = (0..n).map(|i| weights.cardinality(i)).collect();
    let link_count = weights.link_count();
    let mean_neighbors = if n == 0 {
        0.0
    } else {
        link_count as f64 / n as f64
    };
    let pct_nonzero = if n == 0 {
        0.0
    } else {
        100.0 * link_count as f64 / (n as f64 * n as f64)
    };

    WeightsStats {
        unit_count: n,
        link_count,
        islands: cardinalities.iter().filter(|&&c| c == 0).count(),
        components: connected_components(&to_undirected_graph(weights)),
        min_neighbors: cardinalities.iter().copied().min().unwrap_or(0),
        mean_neighbors,
        max_neighbors: cardinalities.iter().copied().max().unwrap_or(0),
        pct_nonzero,
    }
}

/// Labels connected components by breadth-first search, in unit order.
pub fn component_labels<K: UnitKey>(weights: &SpatialWeights<K>) -> ComponentAssignment {
    let graph = to_undirected_graph(weights);
    let mut labels = vec![usize::MAX; weights.len()];
    let mut sizes = Vec::new();
    let mut visited = HashSet::new();

    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let label = sizes.len();
        let mut size = 0;
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            labels[node.index()] = label;
            size += 1;
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        sizes.push(size);
    }

    ComponentAssignment { labels, sizes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::Contiguity;

    #[test]
    fn lattice_is_one_component() {
        let w = SpatialWeights::lattice(4, 5, Contiguity::Rook).unwrap();
        let stats = weights_stats(&w);
        assert_eq!(stats.unit_count, 20);
        assert_eq!(stats.components, 1);
        assert_eq!(stats.islands, 0);
        assert_eq!(stats.min_neighbors, 2);
        assert_eq!(stats.max_neighbors, 4);
        assert!((stats.mean_neighbors - 62.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn components_are_labelled_in_unit_order() {
        let w = SpatialWeights::from_links(
            vec![10, 20, 30, 40, 50],
            vec![(10, 20, 1.0), (40, 50, 1.0), (50, 40, 1.0)],
        )
        .unwrap();

        let assignment = component_labels(&w);
        assert_eq!(assignment.labels, vec![0, 0, 1, 2, 2]);
        assert_eq!(assignment.sizes, vec![2, 1, 2]);
        assert_eq!(weights_stats(&w).components, 3);
    }
}
