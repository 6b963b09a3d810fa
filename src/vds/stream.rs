//! The virtual read stream (components E and F): the stateful cursor that
//! walks a buffer against a [`VdsDescriptor`], delegating covered runs to
//! the external [`ReadVirtual`] callback and filling uncovered ones, and
//! that owns the lifecycle of every source file it opened along the way.

use std::borrow::Cow;
use std::io::SeekFrom;
use std::path::PathBuf;

use crate::coords::linear_to_coords;
use crate::error::{Error, Result, Stage};
use crate::selection::AxisVec;
use crate::vds::access::DatasetAccess;
use crate::vds::delegate::DelegateSelection;
use crate::vds::descriptor::VdsDescriptor;
use crate::vds::resolver::SourceCache;
use crate::vds::traits::{ReadVirtual, VfsFile};

/// Reads a virtual dataset's elements through its mapping table, as a
/// cursor over the dataset's flat, row-major enumeration.
///
/// Disposes of every source file it opened on drop (or on an explicit
/// [`Self::close`]); the host file is never touched.
pub struct VirtualReadStream<'h, 'cb, F: VfsFile, T> {
    host_file: &'h F,
    virtual_file_folder: PathBuf,
    descriptor: VdsDescriptor,
    fill_value: Option<T>,
    access: DatasetAccess,
    cache: SourceCache<F>,
    callback: Box<dyn ReadVirtual<F::Dataset, T> + 'cb>,
    position: i64,
    scratch: AxisVec,
}

impl<'h, 'cb, F: VfsFile, T> VirtualReadStream<'h, 'cb, F, T> {
    /// Builds a stream over `descriptor`, reading source files relative to
    /// `host_file`'s folder unless overridden by `access`'s
    /// `external_file_prefix`.
    #[must_use]
    pub fn new(
        descriptor: VdsDescriptor,
        host_file: &'h F,
        access: DatasetAccess,
        fill_value: Option<T>,
        callback: impl ReadVirtual<F::Dataset, T> + 'cb,
    ) -> Self {
        let rank = descriptor.virtual_dims().len();
        Self {
            host_file,
            virtual_file_folder: host_file.folder_path().to_path_buf(),
            descriptor,
            fill_value,
            access,
            cache: SourceCache::new(),
            callback: Box::new(callback),
            position: 0,
            scratch: AxisVec::from_elem(0, rank),
        }
    }

    #[must_use]
    pub fn virtual_dims(&self) -> &[u64] {
        self.descriptor.virtual_dims()
    }

    #[must_use]
    pub fn total_elements(&self) -> u64 {
        self.virtual_dims().iter().product()
    }

    #[must_use]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Repositions the cursor. Only [`SeekFrom::Start`] is supported; a
    /// virtual dataset's extent is fixed, so "current" and "end" relative
    /// seeks have no stable reference point worth exposing here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for any origin other than `Start`,
    /// and [`Error::Overflow`] if `offset` does not fit in `i64`.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<()> {
        match pos {
            SeekFrom::Start(offset) => {
                self.position = i64::try_from(offset).map_err(|_| Error::Overflow {
                    context: Cow::Borrowed("seek offset exceeds the platform's signed range"),
                })?;
                Ok(())
            }
            SeekFrom::Current(_) | SeekFrom::End(_) => Err(Error::Unsupported {
                details: Cow::Borrowed("only SeekFrom::Start is supported by the virtual read stream"),
            }),
        }
    }

    /// Releases every source file this stream opened. Idempotent; safe to
    /// call even though [`Drop`] also performs this cleanup.
    ///
    /// # Errors
    ///
    /// Never fails: per-file close failures are logged and discarded (see
    /// [`crate::vds::resolver::SourceCache::dispose`]).
    pub fn close(mut self) -> Result<()> {
        self.cache.dispose();
        Ok(())
    }
}

impl<'h, 'cb, F: VfsFile, T: Clone + Default> VirtualReadStream<'h, 'cb, F, T> {
    /// Fills `buffer` with `buffer.len()` consecutive elements starting at
    /// the current position, advancing the position by that amount
    /// (component E).
    ///
    /// For each virtual coordinate, the mapping table is scanned in its
    /// on-disk order; the first entry whose `virtual_selection` covers it
    /// wins ties. A run of consecutive coordinates covered by the same
    /// entry is delegated to the `ReadVirtual` callback in one step; a run
    /// covered by no entry (or whose source file/dataset could not be
    /// resolved) is filled with the configured fill value, or `T::default()`
    /// if none was given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `buffer` extends past the end of
    /// the virtual dataset's enumeration, propagates coordinate-arithmetic
    /// overflow, and propagates any error from resolving a source or from
    /// the `ReadVirtual` callback unchanged.
    pub fn read_virtual(&mut self, buffer: &mut [T]) -> Result<()> {
        let total = self.total_elements();
        let start = u64::try_from(self.position).map_err(|_| Error::Overflow {
            context: Cow::Borrowed("negative stream position"),
        })?;
        let want = u64::try_from(buffer.len()).map_err(|_| Error::Overflow {
            context: Cow::Borrowed("buffer length exceeds u64 range"),
        })?;
        let available = total.saturating_sub(start);
        if want > available {
            return Err(Error::OutOfRange {
                requested: want,
                available,
            });
        }

        let mut filled: u64 = 0;
        while filled < want {
            let linear = start + filled;
            linear_to_coords(self.descriptor.virtual_dims(), linear, &mut self.scratch)?;

            let mut covering: Option<(usize, u64, u64)> = None;
            let mut min_gap: u64 = want - filled;
            for (idx, entry) in self.descriptor.entries().iter().enumerate() {
                let lookup = entry
                    .virtual_selection
                    .to_linear_index(self.descriptor.virtual_dims(), &self.scratch)?;
                if lookup.success {
                    covering = Some((idx, lookup.linear_index, lookup.max_count));
                    break;
                }
                if lookup.max_count > 0 {
                    min_gap = min_gap.min(lookup.max_count);
                }
            }

            let run_cap = want - filled;
            match covering {
                Some((entry_idx, source_linear, max_count)) => {
                    let run = max_count.min(run_cap);
                    let entry = &self.descriptor.entries()[entry_idx];
                    let resolved = self.cache.resolve(
                        entry_idx,
                        entry,
                        self.host_file,
                        &self.virtual_file_folder,
                        &self.access,
                    )?;
                    let dest = slice_at(buffer, filled, run)?;
                    match resolved {
                        Some(info) => {
                            let entry = &self.descriptor.entries()[entry_idx];
                            let source_dims = entry.source_selection.compact_dims();
                            let delegate = DelegateSelection::new(
                                &entry.source_selection,
                                &source_dims,
                                source_linear,
                                run,
                            );
                            self.callback
                                .read_virtual(&info.dataset, dest, delegate, &info.access)
                                .map_err(|err| Error::downstream(Stage::Read { entry: entry_idx }, err))?;
                        }
                        None => fill(dest, &self.fill_value),
                    }
                    filled += run;
                    self.advance_position(run)?;
                }
                None => {
                    let run = min_gap.min(run_cap);
                    let dest = slice_at(buffer, filled, run)?;
                    fill(dest, &self.fill_value);
                    filled += run;
                    self.advance_position(run)?;
                }
            }
        }

        Ok(())
    }

    /// Advances `position` by one completed run. Called incrementally, run
    /// by run, rather than once at the end of `read_virtual`, so that a
    /// downstream error on a later run leaves `position` reflecting the runs
    /// that already completed within this call (spec §5).
    fn advance_position(&mut self, run: u64) -> Result<()> {
        let run = i64::try_from(run).map_err(|_| Error::Overflow {
            context: Cow::Borrowed("advanced position exceeds i64 range"),
        })?;
        self.position = self.position.checked_add(run).ok_or_else(|| Error::Overflow {
            context: Cow::Borrowed("advanced position exceeds i64 range"),
        })?;
        Ok(())
    }
}

fn slice_at<T>(buffer: &mut [T], from: u64, len: u64) -> Result<&mut [T]> {
    let from = usize::try_from(from).map_err(|_| Error::Overflow {
        context: Cow::Borrowed("buffer offset exceeds the platform's usize range"),
    })?;
    let len = usize::try_from(len).map_err(|_| Error::Overflow {
        context: Cow::Borrowed("run length exceeds the platform's usize range"),
    })?;
    Ok(&mut buffer[from..from + len])
}

fn fill<T: Clone + Default>(dest: &mut [T], fill_value: &Option<T>) {
    match fill_value {
        Some(value) => dest.fill(value.clone()),
        None => dest.fill_with(T::default),
    }
}

impl<'h, 'cb, F: VfsFile, T> Drop for VirtualReadStream<'h, 'cb, F, T> {
    fn drop(&mut self) {
        self.cache.dispose();
    }
}
