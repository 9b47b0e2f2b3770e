//! The point and shard data model (spec §3).
//!
//! A [`Shard`] owns a flat coordinate buffer of `len * dims` doubles plus an
//! index array that is the sole object permuted by selection and partition.
//! The coordinate buffer itself is never reordered; only the index is.

/// A single d-dimensional point, as a slice view into a shard's buffer.
pub type PointRef<'a> = &'a [f64];
/// A mutable view of a single d-dimensional point.
pub type PointMut<'a> = &'a mut [f64];

/// A process's local portion of the global point set.
///
/// `coords` is `len() * dims` doubles; `index[i]` is the offset (in units of
/// `dims`) of the `i`-th logical point into `coords`. Permuting `index`
/// reorders the shard without moving any coordinate data.
#[derive(Debug, Clone)]
pub struct Shard {
    dims: usize,
    coords: Vec<f64>,
    index: Vec<usize>,
}

impl Shard {
    /// Builds a shard from a flat coordinate buffer, in natural order.
    pub fn from_coords(dims: usize, coords: Vec<f64>) -> Self {
        assert_eq!(
            coords.len() % dims,
            0,
            "coordinate buffer length must be a multiple of dims"
        );
        let len = coords.len() / dims;
        Shard {
            dims,
            coords,
            index: (0..len).collect(),
        }
    }

    /// An empty shard over `dims` dimensions.
    pub fn empty(dims: usize) -> Self {
        Shard {
            dims,
            coords: Vec::new(),
            index: Vec::new(),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of logical points currently held (after any permutation).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The point at logical position `i`.
    pub fn point(&self, i: usize) -> PointRef<'_> {
        let base = self.index[i] * self.dims;
        &self.coords[base..base + self.dims]
    }

    /// Swaps the logical positions `i` and `j`; no coordinate data moves.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.index.swap(i, j);
    }

    /// Copies out the point at logical position `i` (used when a node's
    /// center or a leaf's payload must outlive the shard).
    pub fn point_owned(&self, i: usize) -> Vec<f64> {
        self.point(i).to_vec()
    }

    /// Raw coordinates in logical order, `len() * dims` doubles — used for
    /// the gather/scatter steps of redistribution, which must ship
    /// contiguous data regardless of how the index has been permuted.
    pub fn to_contiguous(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.index.len() * self.dims);
        for i in 0..self.index.len() {
            out.extend_from_slice(self.point(i));
        }
        out
    }

    /// Builds a new shard, taking ownership of a contiguous coordinate
    /// buffer already in final logical order (used after a scatter).
    pub fn from_contiguous(dims: usize, coords: Vec<f64>) -> Self {
        Self::from_coords(dims, coords)
    }

    /// A sub-shard view `[l, r]` inclusive, copied into a fresh owned shard.
    /// Used when the shared-memory phase takes over a distributed-phase
    /// tail shard of a different provenance than the rest of the recursion.
    pub fn sub_range(&self, l: usize, r: usize) -> Shard {
        let mut coords = Vec::with_capacity((r - l + 1) * self.dims);
        for i in l..=r {
            coords.extend_from_slice(self.point(i));
        }
        Shard::from_coords(self.dims, coords)
    }

    /// The immutable coordinate buffer, for callers that index it directly
    /// against a separately-held index slice (the shared-memory builder
    /// recurses over raw `&mut [usize]` windows so it can split them with
    /// `split_at_mut` for `rayon::join`, the same way the original splits a
    /// pointer array in two for its task pair).
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// The permutable index array: `index[i]` is the row (point number,
    /// not byte/element offset) backing logical position `i`.
    pub fn index_mut(&mut self) -> &mut [usize] {
        &mut self.index
    }
}

/// Looks up the point at local position `pos` of an index window, given the
/// shard's flat coordinate buffer and dimensionality.
pub fn point_at<'a>(coords: &'a [f64], dims: usize, index: &[usize], pos: usize) -> &'a [f64] {
    let row = index[pos];
    &coords[row * dims..row * dims + dims]
}
