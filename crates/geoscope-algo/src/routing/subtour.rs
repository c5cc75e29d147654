//! Subtour detection and cut generation

use geoscope_core::DEPOT;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Every subset of `customers` with at least two members, smallest first.
///
/// Callers bound the customer count; the number of subsets is `2^N - N - 1`.
pub(crate) fn customer_subsets(customers: &[usize]) -> Vec<Vec<usize>> {
    let n = customers.len();
    let mut subsets: Vec<Vec<usize>> = (1u64..(1u64 << n))
        .filter(|mask| mask.count_ones() >= 2)
        .map(|mask| {
            customers
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &c)| c)
                .collect()
        })
        .collect();
    subsets.sort_by_key(Vec::len);
    subsets
}

/// Cycles among customers only, as sorted node lists.
///
/// `arcs` are the selected arcs of one vehicle over `node_count` nodes. Any
/// strongly connected component of two or more nodes that misses the depot
/// is a subtour.
pub(crate) fn find_subtours(node_count: usize, arcs: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut graph = DiGraph::<(), ()>::with_capacity(node_count, arcs.len());
    for _ in 0..node_count {
        graph.add_node(());
    }
    for &(i, j) in arcs {
        graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
    }

    tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() >= 2)
        .map(|component| {
            let mut nodes: Vec<usize> = component.iter().map(|n| n.index()).collect();
            nodes.sort_unstable();
            nodes
        })
        .filter(|nodes| !nodes.contains(&DEPOT))
        .collect()
}

/// Follow successors from the depot until the route closes.
///
/// Returns `[0, c1, .., cm, 0]`, or `None` when the arcs leave the depot
/// zero or several times, or do not close.
pub(crate) fn order_route(arcs: &[(usize, usize)]) -> Option<Vec<usize>> {
    let mut stops = vec![DEPOT];
    let mut current = DEPOT;
    for _ in 0..arcs.len() {
        let mut successors = arcs.iter().filter(|&&(i, _)| i == current).map(|&(_, j)| j);
        let next = successors.next()?;
        if successors.next().is_some() {
            return None;
        }
        stops.push(next);
        if next == DEPOT {
            return (stops.len() == arcs.len() + 1).then_some(stops);
        }
        current = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsets_of_three_customers() {
        let subsets = customer_subsets(&[1, 2, 3]);
        assert_eq!(subsets.len(), 4);
        assert!(subsets[..3].iter().all(|s| s.len() == 2));
        assert_eq!(subsets[3], vec![1, 2, 3]);
    }

    #[test]
    fn detects_cycle_without_depot() {
        // 0 -> 1 -> 0 and 2 -> 3 -> 4 -> 2
        let arcs = [(0, 1), (1, 0), (2, 3), (3, 4), (4, 2)];
        assert_eq!(find_subtours(5, &arcs), vec![vec![2, 3, 4]]);
    }

    #[test]
    fn single_tour_has_no_subtour() {
        let arcs = [(0, 2), (2, 1), (1, 3), (3, 0)];
        assert!(find_subtours(4, &arcs).is_empty());
        assert_eq!(order_route(&arcs), Some(vec![0, 2, 1, 3, 0]));
    }

    #[test]
    fn broken_route_is_not_ordered() {
        let arcs = [(0, 1), (1, 0), (2, 3), (3, 2)];
        assert_eq!(order_route(&arcs), None);
        assert_eq!(order_route(&[(1, 2), (2, 1)]), None);
    }
}
