//! Hyperslab selection algebra (component B): the forward (coordinates to
//! linear index) and reverse (linear index to coordinates) queries the
//! virtual read stream uses to segment a buffer into runs.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::coords::{coords_to_linear, linear_to_coords};
use crate::error::{Error, Result};

/// Inline capacity for per-axis vectors before spilling to the heap. Covers
/// the overwhelming majority of real HDF5 datasets without an allocation.
const INLINE_RANK: usize = 4;

/// A per-axis vector (`start`, `stride`, `count`, `block`, or coordinates).
pub type AxisVec = SmallVec<[u64; INLINE_RANK]>;

/// Outcome of [`HyperslabSelection::to_linear_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearLookup {
    /// `true` iff the queried coordinate lies inside a selected block.
    pub success: bool,
    /// Position of the coordinate within the selection's compact,
    /// gap-free enumeration. Meaningful only when `success` is `true`.
    pub linear_index: u64,
    /// Run length along the fastest-changing axis: remaining selected
    /// elements in the current block when `success`, or the distance to
    /// the next block's start when not (`0` if no further block exists).
    pub max_count: u64,
}

/// A regular multidimensional selection: per axis, `block` consecutive
/// elements every `stride` elements, `count` times, starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperslabSelection {
    start: AxisVec,
    stride: AxisVec,
    count: AxisVec,
    block: AxisVec,
}

enum AxisState {
    BeforeStart,
    Inside { block_idx: u64, within: u64 },
    GapWithin { block_idx: u64 },
    AfterEnd,
}

impl HyperslabSelection {
    /// Builds a selection from explicit per-axis vectors and validates it
    /// against `dims`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the vectors disagree in length,
    /// any invariant (`stride >= block >= 1`, `count >= 1`) is violated, or
    /// the selection's bounding box does not fit within `dims`.
    pub fn new(
        start: impl Into<AxisVec>,
        stride: impl Into<AxisVec>,
        count: impl Into<AxisVec>,
        block: impl Into<AxisVec>,
        dims: &[u64],
    ) -> Result<Self> {
        let selection = Self {
            start: start.into(),
            stride: stride.into(),
            count: count.into(),
            block: block.into(),
        };
        selection.validate(dims)?;
        Ok(selection)
    }

    /// The trivial selection covering every element of `dims`.
    #[must_use]
    pub fn all(dims: &[u64]) -> Self {
        let rank = dims.len();
        let block: AxisVec = dims.iter().copied().collect();
        let stride: AxisVec = block.iter().map(|&b| b.max(1)).collect();
        Self {
            start: AxisVec::from_elem(0, rank),
            stride,
            count: AxisVec::from_elem(1, rank),
            block,
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// The gap-free logical shape this selection enumerates:
    /// `count[k] * block[k]` per axis.
    #[must_use]
    pub fn compact_dims(&self) -> AxisVec {
        self.count
            .iter()
            .zip(self.block.iter())
            .map(|(&c, &b)| c.saturating_mul(b))
            .collect()
    }

    fn validate(&self, dims: &[u64]) -> Result<()> {
        let rank = self.rank();
        if self.stride.len() != rank || self.count.len() != rank || self.block.len() != rank {
            return Err(Error::Configuration {
                stage: crate::error::Stage::Construct,
                details: Cow::Borrowed("hyperslab start/stride/count/block vectors have mismatched lengths"),
            });
        }
        if dims.len() != rank {
            return Err(Error::Configuration {
                stage: crate::error::Stage::Construct,
                details: Cow::Borrowed("hyperslab rank does not match the dimensions it selects over"),
            });
        }
        for k in 0..rank {
            if self.block[k] == 0 || self.count[k] == 0 {
                return Err(Error::Configuration {
                    stage: crate::error::Stage::Construct,
                    details: Cow::Owned(format!("axis {k}: count and block must be at least 1")),
                });
            }
            if self.stride[k] < self.block[k] {
                return Err(Error::Configuration {
                    stage: crate::error::Stage::Construct,
                    details: Cow::Owned(format!("axis {k}: stride must be >= block")),
                });
            }
            let span = (self.count[k] - 1)
                .checked_mul(self.stride[k])
                .and_then(|v| v.checked_add(self.block[k]))
                .ok_or_else(|| Error::Overflow {
                    context: Cow::Borrowed("hyperslab bounding-box span"),
                })?;
            let extent = self
                .start[k]
                .checked_add(span)
                .ok_or_else(|| Error::Overflow {
                    context: Cow::Borrowed("hyperslab bounding-box extent"),
                })?;
            if extent > dims[k] {
                return Err(Error::Configuration {
                    stage: crate::error::Stage::Construct,
                    details: Cow::Owned(format!(
                        "axis {k}: selection bounding box ({extent}) exceeds dimension extent ({})",
                        dims[k]
                    )),
                });
            }
        }
        Ok(())
    }

    fn axis_state(&self, k: usize, coord: u64) -> AxisState {
        let start = self.start[k];
        if coord < start {
            return AxisState::BeforeStart;
        }
        let o = coord - start;
        let bound = (self.count[k] - 1) * self.stride[k] + self.block[k];
        if o >= bound {
            return AxisState::AfterEnd;
        }
        let block_idx = o / self.stride[k];
        let within = o % self.stride[k];
        if within < self.block[k] {
            AxisState::Inside { block_idx, within }
        } else {
            AxisState::GapWithin { block_idx }
        }
    }

    /// Given `coords` in `dims` space, reports whether they are selected
    /// and, if not, how far along the fastest-changing axis the next
    /// selected block begins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if encoding the compact coordinate as a
    /// linear index would overflow `u64`.
    pub fn to_linear_index(&self, dims: &[u64], coords: &[u64]) -> Result<LinearLookup> {
        let rank = self.rank();
        debug_assert_eq!(dims.len(), rank);
        debug_assert_eq!(coords.len(), rank);
        if rank == 0 {
            return Ok(LinearLookup {
                success: true,
                linear_index: 0,
                max_count: 0,
            });
        }
        let last = rank - 1;
        let mut compact: AxisVec = AxisVec::from_elem(0, rank);
        for k in 0..last {
            match self.axis_state(k, coords[k]) {
                AxisState::Inside { block_idx, within } => {
                    compact[k] = block_idx * self.block[k] + within;
                }
                AxisState::BeforeStart | AxisState::GapWithin { .. } | AxisState::AfterEnd => {
                    return Ok(LinearLookup {
                        success: false,
                        linear_index: 0,
                        max_count: 0,
                    });
                }
            }
        }
        match self.axis_state(last, coords[last]) {
            AxisState::Inside { block_idx, within } => {
                compact[last] = block_idx * self.block[last] + within;
                let compact_dims = self.compact_dims();
                let linear_index = coords_to_linear(&compact_dims, &compact)?;
                Ok(LinearLookup {
                    success: true,
                    linear_index,
                    max_count: self.block[last] - within,
                })
            }
            AxisState::BeforeStart => Ok(LinearLookup {
                success: false,
                linear_index: 0,
                max_count: self.start[last] - coords[last],
            }),
            AxisState::GapWithin { block_idx } => {
                let next = block_idx + 1;
                let max_count = if next < self.count[last] {
                    self.stride[last] * next + self.start[last] - coords[last]
                } else {
                    0
                };
                Ok(LinearLookup {
                    success: false,
                    linear_index: 0,
                    max_count,
                })
            }
            AxisState::AfterEnd => Ok(LinearLookup {
                success: false,
                linear_index: 0,
                max_count: 0,
            }),
        }
    }

    /// Inverse of [`Self::to_linear_index`]: given a position in the
    /// selection's compact enumeration, writes the corresponding `dims`
    /// coordinates into `coords_out` and returns the run length remaining
    /// in the current block along the fastest-changing axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if decoding `linear_index` against the
    /// compact dimensions fails.
    pub fn to_coordinates(&self, dims: &[u64], linear_index: u64, coords_out: &mut [u64]) -> Result<u64> {
        let rank = self.rank();
        debug_assert_eq!(dims.len(), rank);
        debug_assert_eq!(coords_out.len(), rank);
        if rank == 0 {
            return Ok(0);
        }
        let compact_dims = self.compact_dims();
        let mut compact: AxisVec = AxisVec::from_elem(0, rank);
        linear_to_coords(&compact_dims, linear_index, &mut compact)?;
        for k in 0..rank {
            let block_idx = compact[k] / self.block[k];
            let within = compact[k] % self.block[k];
            coords_out[k] = self.start[k] + block_idx * self.stride[k] + within;
        }
        let last = rank - 1;
        let within_last = compact[last] % self.block[last];
        Ok(self.block[last] - within_last)
    }

    /// Total number of elements this selection enumerates.
    #[must_use]
    pub fn element_count(&self) -> u64 {
        self.compact_dims().iter().product()
    }
}
