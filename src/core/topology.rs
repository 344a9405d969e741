//! Topology represents an N-dimensional space through a list of dimensions and corresponding stride values.
//! The struct provides methods to convert between linear indices and coordinates in this N-dimensional space,
//! and enumerates the neighbors of an index within a radius, with or without wrap-around.
//!
//! In the HTM Spatial Pooler context, the input and column spaces are N-dimensional.
//! SP uses neighborhood notions for potential pools (input space) and local inhibition (column space).
//! Topology helps manage the relationship between array-like indices and coordinates in these spaces.
//!
//! Neighbor enumeration walks the per-axis offsets `-radius..=radius` with the first axis outermost.
//! Every linear index is reported once, in the order it is first discovered, and the origin is skipped.
//! A radius larger than an axis simply covers that whole axis once.

use serde::{Deserialize, Serialize};

/// Represents the shape of an N-dimensional space, along with precomputed stride values for
/// linear index conversions. The `dims` field stores the size of each dimension, while `strides`
/// stores the cumulative product of dimension sizes to enable fast index calculations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl Topology {
    /// Creates a new `Topology` from a slice of dimension sizes.
    #[inline]
    pub fn new(dimensions: &[usize]) -> Self {
        let dims = dimensions.to_vec();
        let strides = Self::strides(&dims);

        Self { dims, strides }
    }

    /// Computes the stride values for each dimension in a given slice of dimension sizes.
    /// Strides are used to convert coordinates in N-dimensional space into a single linear index.
    #[inline]
    fn strides(dims: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; dims.len()];

        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }

        strides
    }

    /// The size of every dimension, first (slowest varying) axis first.
    #[inline]
    pub fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements in the space.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Converts a linear index into its corresponding set of coordinates in the topology's N-dimensional space.
    /// Each element of the returned `Vec<usize>` is the coordinate along one of the dimensions, in order.
    #[inline]
    pub fn coordinates(&self, index: usize) -> Vec<usize> {
        let mut remainder = index;

        self.strides
            .iter()
            .map(|&stride| {
                let coord = remainder / stride;
                remainder %= stride;
                coord
            })
            .collect()
    }

    /// Converts a set of coordinates in the topology's N-dimensional space to a single linear index.
    /// The length of `coords` must match the number of dimensions in the topology.
    #[inline]
    pub fn index_from_coordinates(&self, coords: &[usize]) -> usize {
        coords.iter().zip(&self.strides).map(|(&c, &s)| c * s).sum()
    }

    /// Returns the distinct indices within `radius` of `center` along every axis, `center` included.
    ///
    /// With `wrapping`, coordinates are taken modulo each dimension (the space behaves like a torus),
    /// otherwise they are clipped at the boundaries.
    pub fn neighborhood(&self, center: usize, radius: usize, wrapping: bool) -> Vec<usize> {
        self.walk(center, radius, wrapping, true)
    }

    /// Upper bound on `neighborhood(_, radius, _).len()` for any center, wrapped or not.
    pub fn max_neighborhood_size(&self, radius: usize) -> usize {
        let window = radius.saturating_mul(2).saturating_add(1);
        self.dims.iter().map(|&dim| window.min(dim)).product()
    }

    /// Returns the distinct indices within `radius` of `center` along every axis, `center` excluded.
    pub fn neighbors(&self, center: usize, radius: usize, wrapping: bool) -> Vec<usize> {
        self.walk(center, radius, wrapping, false)
    }

    fn walk(&self, center: usize, radius: usize, wrapping: bool, with_center: bool) -> Vec<usize> {
        let axes: Vec<Vec<usize>> = self
            .coordinates(center)
            .into_iter()
            .zip(&self.dims)
            .map(|(coord, &dim)| Self::axis_window(coord, dim, radius, wrapping))
            .collect();

        if axes.is_empty() || axes.iter().any(Vec::is_empty) {
            return Vec::new();
        }

        let total: usize = axes.iter().map(Vec::len).product();
        let mut result = Vec::with_capacity(total);
        let mut cursor = vec![0usize; axes.len()];

        // Per-axis windows hold distinct coordinates, so every combination is a distinct index.
        loop {
            let index: usize = cursor
                .iter()
                .zip(&axes)
                .zip(&self.strides)
                .map(|((&k, axis), &stride)| axis[k] * stride)
                .sum();

            if with_center || index != center {
                result.push(index);
            }

            let mut axis = axes.len();
            loop {
                if axis == 0 {
                    return result;
                }
                axis -= 1;
                cursor[axis] += 1;
                if cursor[axis] < axes[axis].len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }
    }

    /// Coordinates covered along one axis, in discovery order (`coord - radius` upwards).
    fn axis_window(coord: usize, dim: usize, radius: usize, wrapping: bool) -> Vec<usize> {
        if dim == 0 {
            return Vec::new();
        }

        if wrapping {
            let count = radius.saturating_mul(2).saturating_add(1).min(dim);
            let start = (coord + dim - radius % dim) % dim;
            (0..count).map(|k| (start + k) % dim).collect()
        } else {
            let low = coord.saturating_sub(radius);
            let high = coord.saturating_add(radius).min(dim - 1);
            (low..=high).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rem(a: isize, b: usize) -> usize {
        a.rem_euclid(b as isize) as usize
    }

    /// Asserts that `mask` holds exactly the indices flagged in `expected`.
    fn assert_mask(mask: &[usize], expected: &[u8]) {
        for (idx, &flag) in expected.iter().enumerate() {
            assert_eq!(mask.contains(&idx), flag == 1, "index {idx} in {mask:?}");
        }
        assert_eq!(mask.len(), expected.iter().filter(|&&f| f == 1).count());
    }

    #[test]
    fn test_coordinates_roundtrip() {
        let topology = Topology::new(&[5, 7, 2]);
        assert_eq!(topology.coordinates(0), vec![0, 0, 0]);
        assert_eq!(topology.coordinates(2 * 14 + 3 * 2 + 1), vec![2, 3, 1]);
        assert_eq!(topology.index_from_coordinates(&[4, 6, 1]), 69);
        assert_eq!(topology.num_elements(), 70);
    }

    #[test]
    fn test_neighbors_3d_wrap_discovery_order() {
        let dims = [5usize, 7, 2];
        let topology = Topology::new(&dims);
        let (z, y, x) = (2isize, 3isize, 1isize);
        let radius = 1isize;
        let center = topology.index_from_coordinates(&[2, 3, 1]);

        let mut expected = Vec::new();
        for i in -radius..=radius {
            for j in -radius..=radius {
                for k in -radius..=radius {
                    let idx = topology.index_from_coordinates(&[
                        rem(z + i, dims[0]),
                        rem(y + j, dims[1]),
                        rem(x + k, dims[2]),
                    ]);
                    if idx != center && !expected.contains(&idx) {
                        expected.push(idx);
                    }
                }
            }
        }

        assert_eq!(topology.neighbors(center, 1, true), expected);
    }

    #[test]
    fn test_neighbors_3d_wrap_large_radius() {
        let dims = [5usize, 7, 9];
        let topology = Topology::new(&dims);
        let (z, y, x) = (3isize, 0isize, 0isize);
        let radius = 3isize;
        let center = topology.index_from_coordinates(&[3, 0, 0]);

        let mut expected = Vec::new();
        for i in -radius..=radius {
            for j in -radius..=radius {
                for k in -radius..=radius {
                    let idx = topology.index_from_coordinates(&[
                        rem(z + i, dims[0]),
                        rem(y + j, dims[1]),
                        rem(x + k, dims[2]),
                    ]);
                    if idx != center && !expected.contains(&idx) {
                        expected.push(idx);
                    }
                }
            }
        }

        assert_eq!(topology.neighbors(center, 3, true), expected);
    }

    #[test]
    fn test_neighbors_4d_wrap() {
        let dims = [5usize, 10, 7, 6];
        let topology = Topology::new(&dims);
        let (z, y, x, w) = (2isize, 6isize, 5isize, 2isize);
        let radius = 4isize;
        let center = topology.index_from_coordinates(&[2, 6, 5, 2]);

        let mut expected = Vec::new();
        for i in -radius..=radius {
            for j in -radius..=radius {
                for k in -radius..=radius {
                    for m in -radius..=radius {
                        let idx = topology.index_from_coordinates(&[
                            rem(z + i, dims[0]),
                            rem(y + j, dims[1]),
                            rem(x + k, dims[2]),
                            rem(w + m, dims[3]),
                        ]);
                        if idx != center && !expected.contains(&idx) {
                            expected.push(idx);
                        }
                    }
                }
            }
        }

        assert_eq!(topology.neighbors(center, 4, true), expected);
    }

    #[test]
    fn test_neighbors_1d() {
        let topology = Topology::new(&[8]);
        assert_mask(&topology.neighbors(3, 1, true), &[0, 0, 1, 0, 1, 0, 0, 0]);
        assert_mask(&topology.neighbors(3, 2, true), &[0, 1, 1, 0, 1, 1, 0, 0]);
        // Wrap around.
        assert_mask(&topology.neighbors(0, 2, true), &[0, 1, 1, 0, 0, 0, 1, 1]);
        // Radius too big.
        assert_mask(&topology.neighbors(6, 20, true), &[1, 1, 1, 1, 1, 1, 0, 1]);
    }

    #[test]
    fn test_neighbors_2d() {
        let topology = Topology::new(&[6, 5]);

        #[rustfmt::skip]
        let ring = [
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
            0, 1, 1, 1, 0,
            0, 1, 0, 1, 0,
            0, 1, 1, 1, 0,
            0, 0, 0, 0, 0,
        ];
        assert_mask(&topology.neighbors(3 * 5 + 2, 1, true), &ring);

        #[rustfmt::skip]
        let wide = [
            0, 0, 0, 0, 0,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 0, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
        ];
        assert_mask(&topology.neighbors(3 * 5 + 2, 2, true), &wide);

        #[rustfmt::skip]
        let everything = [
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 0, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
        ];
        assert_mask(&topology.neighbors(3 * 5 + 2, 7, true), &everything);

        #[rustfmt::skip]
        let corner = [
            1, 0, 0, 1, 1,
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
            1, 0, 0, 1, 1,
            1, 0, 0, 1, 0,
        ];
        assert_mask(&topology.neighbors(29, 1, true), &corner);
    }

    #[test]
    fn test_neighbors_without_wrap() {
        let topology = Topology::new(&[10]);
        assert_eq!(topology.neighbors(8, 2, false), vec![6, 7, 9]);
        assert_eq!(topology.neighbors(0, 1, false), vec![1]);
    }

    #[test]
    fn test_neighborhood_contains_center() {
        let topology = Topology::new(&[10]);
        assert_eq!(topology.neighborhood(5, 1, false), vec![4, 5, 6]);
        assert_eq!(topology.neighborhood(0, 1, true), vec![9, 0, 1]);
        assert_eq!(topology.neighborhood(4, 0, true), vec![4]);
    }
}
