//! The translated selection handed to the external `ReadVirtual` callback
//! (component E, step 4): an iterator of `(coords, element_count)` steps
//! over the *source* dataset, derived by walking a run of the virtual
//! enumeration through the entry's `source_selection`.

use crate::error::Result;
use crate::selection::{AxisVec, HyperslabSelection};

/// Emits `(coords, element_count)` steps over a source dataset's
/// coordinate space for one contiguous run of a VDS entry's mapping.
///
/// This does not implement [`Iterator`] because each step borrows a
/// coordinate buffer owned by the selection being walked; call
/// [`Self::next_step`] in a `while let Some(..) = ...` loop instead.
pub struct DelegateSelection<'a> {
    selection: &'a HyperslabSelection,
    source_dims: &'a [u64],
    next_linear: u64,
    remaining: u64,
    scratch: AxisVec,
}

impl<'a> DelegateSelection<'a> {
    pub(crate) fn new(
        selection: &'a HyperslabSelection,
        source_dims: &'a [u64],
        start_linear: u64,
        run_len: u64,
    ) -> Self {
        let rank = selection.rank();
        Self {
            selection,
            source_dims,
            next_linear: start_linear,
            remaining: run_len,
            scratch: AxisVec::from_elem(0, rank),
        }
    }

    /// Total number of elements this delegate selection enumerates.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.remaining
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Advances to the next step, returning the source coordinates and the
    /// number of consecutive elements starting there.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `to_coordinates` arithmetic
    /// overflows.
    pub fn next_step(&mut self) -> Result<Option<(&[u64], u64)>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let max_run = self
            .selection
            .to_coordinates(self.source_dims, self.next_linear, &mut self.scratch)?;
        let run = max_run.min(self.remaining);
        self.next_linear += run;
        self.remaining -= run;
        Ok(Some((&self.scratch[..], run)))
    }
}
