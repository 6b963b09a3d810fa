//! External interfaces (§6): the collaborators the VDS engine calls out to
//! but does not implement itself. Byte-level parsing, object headers, and
//! non-VDS layouts live behind these traits in the containing reader.

use std::path::Path;

use crate::error::Result;
use crate::vds::access::DatasetAccess;
use crate::vds::delegate::DelegateSelection;

/// An HDF5 file the VDS engine can open source datasets from.
///
/// Implemented by the containing reader; this crate never parses bytes off
/// disk itself.
pub trait VfsFile: Sized {
    /// Handle to a dataset opened within this file.
    type Dataset;

    /// Opens `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    fn open_read(path: &Path) -> Result<Self>;

    /// Reports whether `path` names an existing link (dataset, group, or
    /// otherwise) within this file.
    fn link_exists(&self, path: &str) -> bool;

    /// Looks up a dataset by its path within this file.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened as a dataset.
    fn dataset(&self, path: &str) -> Result<Self::Dataset>;

    /// The directory containing this file, used to resolve relative
    /// `source_file_name` references.
    fn folder_path(&self) -> &Path;

    /// Releases this file handle.
    ///
    /// # Errors
    ///
    /// May return an error; callers that only need best-effort disposal
    /// (the VDS lifecycle, component F) log and discard it.
    fn close(self) -> Result<()>;
}

/// Callback used to read `run` decoded elements of type `T` from a resolved
/// source dataset into `destination`, translating through `selection`.
///
/// Expressed as an explicit function-valued parameter (rather than a global)
/// so that a `Dataset::read` implementation may recursively dispatch back
/// into another VDS engine (a VDS whose sources are themselves virtual)
/// without creating a cyclic module dependency.
pub trait ReadVirtual<D, T> {
    /// # Errors
    ///
    /// Returns an error if the underlying dataset read fails; the VDS
    /// engine propagates this unchanged (wrapped with [`crate::error::Stage::Read`]
    /// context) and aborts the current `read_virtual` call.
    fn read_virtual(
        &mut self,
        dataset: &D,
        destination: &mut [T],
        selection: DelegateSelection<'_>,
        access: &DatasetAccess,
    ) -> Result<()>;
}

impl<D, T, F> ReadVirtual<D, T> for F
where
    F: FnMut(&D, &mut [T], DelegateSelection<'_>, &DatasetAccess) -> Result<()>,
{
    fn read_virtual(
        &mut self,
        dataset: &D,
        destination: &mut [T],
        selection: DelegateSelection<'_>,
        access: &DatasetAccess,
    ) -> Result<()> {
        self(dataset, destination, selection, access)
    }
}
