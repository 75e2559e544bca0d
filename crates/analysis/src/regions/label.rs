//! Connected-component labeling over binary masks
//!
//! Row-major union-find with 8-connectivity. The row-major scan fixes the
//! component order (first pixel appearance), so detection lists are stable
//! across runs and test fixtures.

use terrashift_core::Raster;

/// Disjoint-set forest with path halving and union by size
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            self.parent[ra] = rb;
            self.size[rb] += self.size[ra];
        } else {
            self.parent[rb] = ra;
            self.size[ra] += self.size[rb];
        }
    }
}

/// Label 8-connected components of a binary mask (non-zero = set).
///
/// Returns one pixel list per component, pixels as (row, col) in row-major
/// order, components ordered by the position of their first pixel.
pub fn label_components(mask: &Raster<u8>) -> Vec<Vec<(usize, usize)>> {
    let (rows, cols) = mask.shape();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let mut uf = UnionFind::new(rows * cols);

    for row in 0..rows {
        for col in 0..cols {
            if unsafe { mask.get_unchecked(row, col) } == 0 {
                continue;
            }
            let idx = row * cols + col;

            // Union with already-scanned neighbors: W, NW, N, NE
            if col > 0 && unsafe { mask.get_unchecked(row, col - 1) } != 0 {
                uf.union(idx, idx - 1);
            }
            if row > 0 {
                if col > 0 && unsafe { mask.get_unchecked(row - 1, col - 1) } != 0 {
                    uf.union(idx, idx - cols - 1);
                }
                if unsafe { mask.get_unchecked(row - 1, col) } != 0 {
                    uf.union(idx, idx - cols);
                }
                if col + 1 < cols && unsafe { mask.get_unchecked(row - 1, col + 1) } != 0 {
                    uf.union(idx, idx - cols + 1);
                }
            }
        }
    }

    // Second pass: assign component numbers in order of first appearance
    let mut component_of_root = vec![usize::MAX; rows * cols];
    let mut components: Vec<Vec<(usize, usize)>> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            if unsafe { mask.get_unchecked(row, col) } == 0 {
                continue;
            }
            let root = uf.find(row * cols + col);
            let comp = if component_of_root[root] == usize::MAX {
                component_of_root[root] = components.len();
                components.push(Vec::new());
                components.len() - 1
            } else {
                component_of_root[root]
            };
            components[comp].push((row, col));
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: usize, cols: usize, set: &[(usize, usize)]) -> Raster<u8> {
        let mut m = Raster::new(rows, cols);
        for &(r, c) in set {
            m.set(r, c, 1).unwrap();
        }
        m
    }

    #[test]
    fn test_empty_mask() {
        let m: Raster<u8> = Raster::new(5, 5);
        assert!(label_components(&m).is_empty());
    }

    #[test]
    fn test_single_component() {
        let m = mask_from(5, 5, &[(1, 1), (1, 2), (2, 2)]);
        let comps = label_components(&m);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 3);
    }

    #[test]
    fn test_diagonal_is_connected() {
        // 8-connectivity joins diagonal neighbors
        let m = mask_from(5, 5, &[(0, 0), (1, 1), (2, 2)]);
        let comps = label_components(&m);
        assert_eq!(comps.len(), 1);
    }

    #[test]
    fn test_separate_components_ordered() {
        let m = mask_from(6, 6, &[(0, 0), (4, 4), (4, 5)]);
        let comps = label_components(&m);
        assert_eq!(comps.len(), 2);
        // Row-major first-appearance order
        assert_eq!(comps[0], vec![(0, 0)]);
        assert_eq!(comps[1], vec![(4, 4), (4, 5)]);
    }

    #[test]
    fn test_u_shape_merges() {
        // U shape: two arms joined at the bottom must be one component
        let m = mask_from(
            4,
            5,
            &[
                (0, 0),
                (1, 0),
                (2, 0),
                (0, 4),
                (1, 4),
                (2, 4),
                (3, 0),
                (3, 1),
                (3, 2),
                (3, 3),
                (3, 4),
            ],
        );
        let comps = label_components(&m);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 11);
    }
}
