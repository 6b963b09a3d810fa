//! In-memory representation of a parsed VDS mapping table (component C).
//!
//! Decoding the raw global-heap bytes into [`VdsDatasetEntry`] values is an
//! external collaborator's job (object-header and global-heap parsing live
//! outside this crate); this module only owns the validated, ordered result.

use std::borrow::Cow;

use crate::coords::has_unlimited_dimension;
use crate::error::{Error, Result, Stage};
use crate::selection::HyperslabSelection;

/// Sentinel source file name meaning "the file containing the virtual
/// dataset itself".
pub const SELF_FILE: &str = ".";

/// One row of a VDS mapping table: a correspondence between a region of the
/// virtual dataspace and a region of some source dataset.
#[derive(Debug, Clone)]
pub struct VdsDatasetEntry {
    /// Name of the file holding the source dataset, or [`SELF_FILE`].
    pub source_file_name: String,
    /// Path of the source dataset within that file.
    pub source_dataset: String,
    /// Region of the virtual dataspace this entry covers.
    pub virtual_selection: HyperslabSelection,
    /// Region of the source dataset this entry reads from.
    pub source_selection: HyperslabSelection,
}

impl VdsDatasetEntry {
    #[must_use]
    pub fn is_self_referential(&self) -> bool {
        self.source_file_name == SELF_FILE
    }
}

/// The fully parsed, ordered VDS mapping table for one virtual dataset.
///
/// Entry order is the descriptor's on-disk order and is load-bearing: when
/// more than one entry covers a given virtual coordinate, the first one in
/// this order wins (see [`crate::vds::stream::VirtualReadStream`]).
#[derive(Debug, Clone)]
pub struct VdsDescriptor {
    virtual_dims: Vec<u64>,
    entries: Vec<VdsDatasetEntry>,
}

impl VdsDescriptor {
    /// Builds a descriptor from already-decoded entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnlimitedDimension`] if any axis of `virtual_dims`
    /// equals the HDF5 unlimited-dimension sentinel; unlimited-dimension
    /// virtual datasets are an explicit non-goal of this engine.
    pub fn new(virtual_dims: Vec<u64>, entries: Vec<VdsDatasetEntry>) -> Result<Self> {
        if let Some(axis) = has_unlimited_dimension(&virtual_dims) {
            return Err(Error::UnlimitedDimension { axis });
        }
        if virtual_dims.is_empty() {
            return Err(Error::Configuration {
                stage: Stage::Construct,
                details: Cow::Borrowed("a virtual dataset must have at least one dimension"),
            });
        }
        Ok(Self {
            virtual_dims,
            entries,
        })
    }

    #[must_use]
    pub fn virtual_dims(&self) -> &[u64] {
        &self.virtual_dims
    }

    #[must_use]
    pub fn entries(&self) -> &[VdsDatasetEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
