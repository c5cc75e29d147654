//! Spatial weights graphs.
//!
//! A [`SpatialWeights`] maps every spatial unit to its neighbors and the
//! strength of each link. Units are identified by a caller-chosen key (tract
//! GEOIDs, integer indices, ...) and kept in a fixed order so observation
//! vectors can be index-aligned with the graph.
//!
//! Weights are stored as given. Row standardization is an explicit transform
//! ([`SpatialWeights::row_standardized`]) and is never applied implicitly.
//!
//! ```
//! use geoscope_core::{Contiguity, SpatialWeights};
//!
//! let w = SpatialWeights::lattice(3, 3, Contiguity::Rook).unwrap();
//! assert_eq!(w.len(), 9);
//! assert_eq!(w.cardinality(4), 4); // centre cell
//!
//! let r = w.row_standardized();
//! assert!(r.is_row_standardized(1e-12));
//! assert!((r.s0() - 9.0).abs() < 1e-12);
//! ```

use crate::diagnostics::Diagnostics;
use crate::error::{GeoscopeError, GeoscopeResult};
use crate::graph_utils::weights_stats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Requirements on spatial unit identifiers.
pub trait UnitKey: Clone + Eq + Hash + Display {}

impl<T: Clone + Eq + Hash + Display> UnitKey for T {}

/// Neighbor rule for regular lattices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contiguity {
    /// Cells sharing an edge
    Rook,
    /// Cells sharing an edge or a corner
    Queen,
}

/// Which transform the stored weights currently carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightsTransform {
    /// Weights exactly as supplied
    Original,
    /// Every non-empty row sums to one
    Row,
    /// Every link has weight one
    Binary,
}

/// Adjacency structure with non-negative link weights and no self-loops.
#[derive(Debug, Clone)]
pub struct SpatialWeights<K> {
    ids: Vec<K>,
    index: HashMap<K, usize>,
    /// Per unit: (neighbor index, weight), sorted by neighbor index
    rows: Vec<Vec<(usize, f64)>>,
    transform: WeightsTransform,
}

impl<K: UnitKey> SpatialWeights<K> {
    /// Build a weights graph from an ordered id list and a neighbor mapping.
    ///
    /// Units missing from `neighbors` become islands. Fails naming the key on
    /// self-loops, keys not present in `ids`, duplicate ids and negative or
    /// non-finite weights.
    pub fn new(ids: Vec<K>, neighbors: HashMap<K, HashMap<K, f64>>) -> GeoscopeResult<Self> {
        let index = build_index(&ids)?;
        let mut rows = vec![Vec::new(); ids.len()];

        for (unit, links) in neighbors {
            let i = lookup(&index, &unit)?;
            let mut row = Vec::with_capacity(links.len());
            for (neighbor, weight) in links {
                let j = lookup(&index, &neighbor)?;
                if i == j {
                    return Err(GeoscopeError::SelfLoop {
                        unit: unit.to_string(),
                    });
                }
                if !weight.is_finite() || weight < 0.0 {
                    return Err(GeoscopeError::InvalidWeight {
                        unit: unit.to_string(),
                        neighbor: neighbor.to_string(),
                        weight,
                    });
                }
                row.push((j, weight));
            }
            // Deterministic summation order regardless of map iteration order
            row.sort_by_key(|(j, _)| *j);
            rows[i] = row;
        }

        Ok(Self {
            ids,
            index,
            rows,
            transform: WeightsTransform::Original,
        })
    }

    /// Build a weights graph from `(unit, neighbor, weight)` triples.
    ///
    /// A repeated `(unit, neighbor)` pair keeps the last weight.
    pub fn from_links(
        ids: Vec<K>,
        links: impl IntoIterator<Item = (K, K, f64)>,
    ) -> GeoscopeResult<Self> {
        let mut neighbors: HashMap<K, HashMap<K, f64>> = HashMap::new();
        for (unit, neighbor, weight) in links {
            neighbors.entry(unit).or_default().insert(neighbor, weight);
        }
        Self::new(ids, neighbors)
    }

    /// K-nearest-neighbor weights from planar coordinates (binary weights).
    ///
    /// Distances are Euclidean; ties are broken by the lower unit index.
    /// The resulting graph is generally asymmetric.
    pub fn knn(points: Vec<(K, [f64; 2])>, k: usize) -> GeoscopeResult<Self> {
        let n = points.len();
        if k == 0 || k >= n {
            return Err(GeoscopeError::Validation(format!(
                "k must be between 1 and {} for {} points, got {}",
                n.saturating_sub(1),
                n,
                k
            )));
        }
        if let Some((id, _)) = points
            .iter()
            .find(|(_, p)| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(GeoscopeError::Validation(format!(
                "non-finite coordinates for unit {}",
                id
            )));
        }

        let coords: Vec<[f64; 2]> = points.iter().map(|(_, p)| *p).collect();
        let ids: Vec<K> = points.into_iter().map(|(id, _)| id).collect();
        let index = build_index(&ids)?;

        let rows = (0..n)
            .map(|i| {
                let mut candidates: Vec<(f64, usize)> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| {
                        let dx = coords[i][0] - coords[j][0];
                        let dy = coords[i][1] - coords[j][1];
                        (dx.hypot(dy), j)
                    })
                    .collect();
                candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                let mut row: Vec<(usize, f64)> =
                    candidates.into_iter().take(k).map(|(_, j)| (j, 1.0)).collect();
                row.sort_by_key(|(j, _)| *j);
                row
            })
            .collect();

        Ok(Self {
            ids,
            index,
            rows,
            transform: WeightsTransform::Original,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Unit ids in observation order
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    pub fn id(&self, index: usize) -> &K {
        &self.ids[index]
    }

    pub fn index_of(&self, unit: &K) -> Option<usize> {
        self.index.get(unit).copied()
    }

    /// Neighbors of the unit at `index` as `(neighbor index, weight)`
    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        &self.rows[index]
    }

    /// Weight of the link `i -> j` (zero when absent)
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.rows[i]
            .binary_search_by_key(&j, |(n, _)| *n)
            .map(|pos| self.rows[i][pos].1)
            .unwrap_or(0.0)
    }

    /// Whether the link `i -> j` is stored, whatever its weight
    pub fn has_link(&self, i: usize, j: usize) -> bool {
        self.rows[i]
            .binary_search_by_key(&j, |(n, _)| *n)
            .is_ok()
    }

    /// Number of neighbors of the unit at `index`
    pub fn cardinality(&self, index: usize) -> usize {
        self.rows[index].len()
    }

    /// Total number of directed links
    pub fn link_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn transform(&self) -> WeightsTransform {
        self.transform
    }

    /// Sum of all weights (S0)
    pub fn s0(&self) -> f64 {
        self.rows.iter().flatten().map(|(_, w)| w).sum()
    }

    /// Sum of every row
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|(_, w)| w).sum())
            .collect()
    }

    /// Units without neighbors
    pub fn islands(&self) -> Vec<&K> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_empty())
            .map(|(i, _)| &self.ids[i])
            .collect()
    }

    /// Iterate over all links as `(i, j, w_ij)`
    pub fn links(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |&(j, w)| (i, j, w)))
    }

    /// Row-standardized copy: each non-empty row divided by its sum.
    ///
    /// Islands keep an empty row. Rows whose weights are all zero are left
    /// untouched.
    pub fn row_standardized(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let sum: f64 = row.iter().map(|(_, w)| w).sum();
                if sum > 0.0 {
                    row.iter().map(|&(j, w)| (j, w / sum)).collect()
                } else {
                    row.clone()
                }
            })
            .collect();
        Self {
            ids: self.ids.clone(),
            index: self.index.clone(),
            rows,
            transform: WeightsTransform::Row,
        }
    }

    /// Binary copy: every link gets weight one.
    pub fn binary(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|&(j, _)| (j, 1.0)).collect())
            .collect();
        Self {
            ids: self.ids.clone(),
            index: self.index.clone(),
            rows,
            transform: WeightsTransform::Binary,
        }
    }

    /// Whether every non-island row sums to one within `tol`.
    pub fn is_row_standardized(&self, tol: f64) -> bool {
        self.rows
            .iter()
            .filter(|row| !row.is_empty())
            .all(|row| (row.iter().map(|(_, w)| w).sum::<f64>() - 1.0).abs() <= tol)
    }

    /// Whether `w_ij == w_ji` for every link within `tol`.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        self.links()
            .all(|(i, j, w)| (self.weight(j, i) - w).abs() <= tol)
    }

    /// Spatial lag `W y`.
    pub fn spatial_lag(&self, y: &[f64]) -> GeoscopeResult<Vec<f64>> {
        self.check_length(y.len())?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.iter().map(|&(j, w)| w * y[j]).sum())
            .collect())
    }

    /// Turn keyed observations into a vector aligned with [`ids`](Self::ids).
    ///
    /// Fails naming the first unit without an observation, or the first
    /// observation key that is not a unit of this graph.
    pub fn align(&self, values: &HashMap<K, f64>) -> GeoscopeResult<Vec<f64>> {
        let mut aligned = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            match values.get(id) {
                Some(v) => aligned.push(*v),
                None => {
                    return Err(GeoscopeError::MissingObservation {
                        unit: id.to_string(),
                    })
                }
            }
        }
        if let Some(extra) = values.keys().find(|k| !self.index.contains_key(*k)) {
            return Err(GeoscopeError::UnknownUnit {
                unit: extra.to_string(),
            });
        }
        Ok(aligned)
    }

    /// Check that an observation vector has one value per unit.
    pub fn check_length(&self, len: usize) -> GeoscopeResult<()> {
        if len != self.ids.len() {
            return Err(GeoscopeError::Validation(format!(
                "expected {} observations (one per spatial unit), got {}",
                self.ids.len(),
                len
            )));
        }
        Ok(())
    }

    /// Report islands, asymmetric links and disconnected components.
    pub fn diagnose(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();

        for island in self.islands() {
            diag.add_warning_with_unit("islands", "unit has no neighbors", &island.to_string());
        }

        let asymmetric = self
            .links()
            .filter(|&(i, j, _)| !self.has_link(j, i))
            .count();
        if asymmetric > 0 {
            diag.add_warning(
                "symmetry",
                &format!("{} link(s) have no reverse link", asymmetric),
            );
        }

        let stats = weights_stats(self);
        if stats.components > 1 {
            diag.add_warning(
                "connectivity",
                &format!("graph has {} disconnected components", stats.components),
            );
        }

        tracing::debug!(
            units = self.len(),
            links = self.link_count(),
            components = stats.components,
            "weights diagnostics: {}",
            diag.summary()
        );
        diag
    }
}

impl SpatialWeights<usize> {
    /// Binary contiguity weights for a `rows x cols` lattice.
    ///
    /// Cells are numbered row-major from zero.
    pub fn lattice(rows: usize, cols: usize, contiguity: Contiguity) -> GeoscopeResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(GeoscopeError::Validation(format!(
                "lattice dimensions must be positive, got {}x{}",
                rows, cols
            )));
        }

        let offsets: &[(isize, isize)] = match contiguity {
            Contiguity::Rook => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Contiguity::Queen => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        };

        let n = rows * cols;
        let mut weight_rows = Vec::with_capacity(n);
        for r in 0..rows {
            for c in 0..cols {
                let mut row = Vec::with_capacity(offsets.len());
                for &(dr, dc) in offsets {
                    let (nr, nc) = (r as isize + dr, c as isize + dc);
                    if nr >= 0 && nc >= 0 && (nr as usize) < rows && (nc as usize) < cols {
                        row.push((nr as usize * cols + nc as usize, 1.0));
                    }
                }
                row.sort_by_key(|(j, _)| *j);
                weight_rows.push(row);
            }
        }

        let ids: Vec<usize> = (0..n).collect();
        let index = ids.iter().map(|&i| (i, i)).collect();
        Ok(Self {
            ids,
            index,
            rows: weight_rows,
            transform: WeightsTransform::Original,
        })
    }
}

fn build_index<K: UnitKey>(ids: &[K]) -> GeoscopeResult<HashMap<K, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(GeoscopeError::DuplicateUnit {
                unit: id.to_string(),
            });
        }
    }
    Ok(index)
}

fn lookup<K: UnitKey>(index: &HashMap<K, usize>, unit: &K) -> GeoscopeResult<usize> {
    index
        .get(unit)
        .copied()
        .ok_or_else(|| GeoscopeError::UnknownUnit {
            unit: unit.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_with_island() -> SpatialWeights<String> {
        let ids = vec!["a".to_string(), "b".into(), "c".into(), "d".into()];
        SpatialWeights::from_links(
            ids,
            vec![
                ("a".to_string(), "b".to_string(), 1.0),
                ("b".into(), "a".into(), 1.0),
                ("b".into(), "c".into(), 3.0),
                ("c".into(), "b".into(), 3.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_self_loop_naming_unit() {
        let err = SpatialWeights::from_links(vec![1, 2], vec![(2, 2, 1.0)]).unwrap_err();
        assert!(matches!(err, GeoscopeError::SelfLoop { ref unit } if unit == "2"));
    }

    #[test]
    fn rejects_unknown_neighbor() {
        let err = SpatialWeights::from_links(vec![1, 2], vec![(1, 9, 1.0)]).unwrap_err();
        assert!(matches!(err, GeoscopeError::UnknownUnit { ref unit } if unit == "9"));
    }

    #[test]
    fn rejects_duplicate_ids_and_negative_weights() {
        assert!(matches!(
            SpatialWeights::from_links(vec![1, 1], Vec::new()),
            Err(GeoscopeError::DuplicateUnit { .. })
        ));
        assert!(matches!(
            SpatialWeights::from_links(vec![1, 2], vec![(1, 2, -0.5)]),
            Err(GeoscopeError::InvalidWeight { .. })
        ));
        assert!(matches!(
            SpatialWeights::from_links(vec![1, 2], vec![(1, 2, f64::NAN)]),
            Err(GeoscopeError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn row_standardization_is_explicit() {
        let w = triangle_with_island();
        assert_eq!(w.transform(), WeightsTransform::Original);
        assert!(!w.is_row_standardized(1e-12));
        assert!((w.s0() - 8.0).abs() < 1e-12);

        let r = w.row_standardized();
        assert_eq!(r.transform(), WeightsTransform::Row);
        assert!(r.is_row_standardized(1e-12));
        // b has weights 1 and 3
        let b = r.index_of(&"b".to_string()).unwrap();
        assert!((r.weight(b, 0) - 0.25).abs() < 1e-12);
        assert!((r.weight(b, 2) - 0.75).abs() < 1e-12);
        // island row stays empty, so S0 counts only the three linked units
        assert!((r.s0() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn binary_transform_sets_unit_weights() {
        let b = triangle_with_island().binary();
        assert_eq!(b.transform(), WeightsTransform::Binary);
        assert!((b.s0() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn islands_and_diagnostics() {
        let w = triangle_with_island();
        assert_eq!(w.islands(), vec![&"d".to_string()]);

        let diag = w.diagnose();
        assert_eq!(diag.issues_by_category("islands").count(), 1);
        assert_eq!(diag.issues_by_category("connectivity").count(), 1);
        assert_eq!(diag.issues_by_category("symmetry").count(), 0);
    }

    #[test]
    fn zero_weight_reverse_link_is_not_asymmetric() {
        let w = SpatialWeights::from_links(vec![0, 1], [(0, 1, 0.0), (1, 0, 2.0)]).unwrap();
        assert!(w.has_link(0, 1));
        assert_eq!(w.weight(0, 1), 0.0);
        assert_eq!(w.diagnose().issues_by_category("symmetry").count(), 0);

        let one_way = SpatialWeights::from_links(vec![0, 1], [(1, 0, 2.0)]).unwrap();
        assert!(!one_way.has_link(0, 1));
        assert_eq!(one_way.diagnose().issues_by_category("symmetry").count(), 1);
    }

    #[test]
    fn lattice_cardinalities() {
        let rook = SpatialWeights::lattice(3, 3, Contiguity::Rook).unwrap();
        assert_eq!(rook.cardinality(0), 2);
        assert_eq!(rook.cardinality(1), 3);
        assert_eq!(rook.cardinality(4), 4);
        assert_eq!(rook.link_count(), 24);
        assert!(rook.is_symmetric(0.0));

        let queen = SpatialWeights::lattice(3, 3, Contiguity::Queen).unwrap();
        assert_eq!(queen.cardinality(0), 3);
        assert_eq!(queen.cardinality(4), 8);

        assert!(SpatialWeights::lattice(0, 3, Contiguity::Rook).is_err());
    }

    #[test]
    fn knn_picks_closest_points() {
        let points = vec![
            ("p0", [0.0, 0.0]),
            ("p1", [1.0, 0.0]),
            ("p2", [5.0, 0.0]),
            ("p3", [5.5, 0.0]),
        ];
        let w = SpatialWeights::knn(points, 1).unwrap();
        assert_eq!(w.neighbors(0), &[(1, 1.0)]);
        assert_eq!(w.neighbors(2), &[(3, 1.0)]);
        assert_eq!(w.neighbors(3), &[(2, 1.0)]);

        assert!(SpatialWeights::knn(vec![("a", [0.0, 0.0]), ("b", [1.0, 1.0])], 2).is_err());
    }

    #[test]
    fn spatial_lag_and_length_check() {
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook)
            .unwrap()
            .row_standardized();
        let lag = w.spatial_lag(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(lag, vec![2.0, 2.0, 2.0]);
        assert!(w.spatial_lag(&[1.0]).is_err());
    }

    #[test]
    fn align_names_missing_and_extra_keys() {
        let w = triangle_with_island();
        let mut values: HashMap<String, f64> = ["a", "b", "c"]
            .iter()
            .map(|k| (k.to_string(), 1.0))
            .collect();

        let err = w.align(&values).unwrap_err();
        assert!(matches!(err, GeoscopeError::MissingObservation { ref unit } if unit == "d"));

        values.insert("d".into(), 4.0);
        assert_eq!(w.align(&values).unwrap(), vec![1.0, 1.0, 1.0, 4.0]);

        values.insert("zz".into(), 0.0);
        let err = w.align(&values).unwrap_err();
        assert!(matches!(err, GeoscopeError::UnknownUnit { ref unit } if unit == "zz"));
    }
}
