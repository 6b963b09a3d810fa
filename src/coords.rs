//! Row-major coordinate arithmetic shared by the selection algebra and the
//! virtual read stream (component A).

use std::borrow::Cow;

use crate::error::{Error, Result};

/// HDF5's "unlimited" dimension sentinel. A virtual dataset's extents must
/// never contain this value; see [`crate::vds::descriptor::VdsDescriptor`].
pub const UNLIMITED: u64 = u64::MAX;

/// Converts a linear, row-major index into per-axis coordinates.
///
/// `dims[0]` is the slowest-changing axis. `coords` must have the same
/// length as `dims`; it is overwritten in place.
///
/// # Errors
///
/// Returns [`Error::Overflow`] if `dims` is empty while `idx != 0`, or if any
/// intermediate division is performed against a zero extent.
pub fn linear_to_coords(dims: &[u64], mut idx: u64, coords: &mut [u64]) -> Result<()> {
    debug_assert_eq!(dims.len(), coords.len());
    for k in (0..dims.len()).rev() {
        let extent = dims[k];
        if extent == 0 {
            return Err(Error::Overflow {
                context: Cow::Borrowed("linear_to_coords against a zero-extent dimension"),
            });
        }
        coords[k] = idx % extent;
        idx /= extent;
    }
    Ok(())
}

/// Converts per-axis coordinates into a linear, row-major index.
///
/// # Errors
///
/// Returns [`Error::Overflow`] if the row-major encoding overflows `u64`.
pub fn coords_to_linear(dims: &[u64], coords: &[u64]) -> Result<u64> {
    debug_assert_eq!(dims.len(), coords.len());
    let mut linear: u64 = 0u64;
    let mut stride: u64 = 1u64;
    for k in (0..dims.len()).rev() {
        let term = coords[k].checked_mul(stride).ok_or_else(overflow)?;
        linear = linear.checked_add(term).ok_or_else(overflow)?;
        if k > 0 {
            stride = stride.checked_mul(dims[k]).ok_or_else(overflow)?;
        }
    }
    Ok(linear)
}

fn overflow() -> Error {
    Error::Overflow {
        context: Cow::Borrowed("coords_to_linear"),
    }
}

/// Returns `true` iff any dimension in `dims` equals the unlimited sentinel.
#[must_use]
pub fn has_unlimited_dimension(dims: &[u64]) -> Option<usize> {
    dims.iter().position(|&extent| extent == UNLIMITED)
}
