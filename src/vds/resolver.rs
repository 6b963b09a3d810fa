//! Source resolver & cache (component D): locates, opens, and memoizes the
//! source file/dataset pair behind one VDS mapping entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, Stage};
use crate::logger::log_warn;
use crate::vds::access::DatasetAccess;
use crate::vds::descriptor::VdsDatasetEntry;
use crate::vds::traits::VfsFile;

/// Whether a resolved file handle was opened by this engine (and must be
/// disposed of) or is the shared host file (never disposed of here).
pub(crate) enum DatasetFile<F> {
    Host,
    Owned(F),
}

/// A resolved, cached source dataset: the opened file (or a marker that it
/// is the host file), the dataset handle, and the access properties used to
/// open it.
pub struct DatasetInfo<F: VfsFile> {
    file: DatasetFile<F>,
    pub dataset: F::Dataset,
    pub access: DatasetAccess,
}

impl<F: VfsFile> DatasetInfo<F> {
    /// `true` iff this engine opened the underlying file itself, as
    /// opposed to reusing the host file.
    #[must_use]
    pub fn owns_file(&self) -> bool {
        matches!(self.file, DatasetFile::Owned(_))
    }
}

/// Identifies a source by the raw `(source_file_name, source_dataset)` pair
/// an entry names, so that distinct mapping-table entries referencing the
/// same source share one opened file/dataset handle (spec §8, S8).
type SourceKey = (String, String);

pub(crate) struct SourceCache<F: VfsFile> {
    cache: HashMap<SourceKey, DatasetInfo<F>>,
}

impl<F: VfsFile> SourceCache<F> {
    pub(crate) fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Resolves `entry`, memoizing the result by its
    /// `(source_file_name, source_dataset)` pair so any other entry naming
    /// the same source reuses the same opened handle. `entry_index` is
    /// carried only for diagnostics. Returns `Ok(None)` for a soft
    /// resolution miss (missing file or dataset); returns `Err` only for a
    /// genuine downstream I/O failure (component D, step 2-4; see spec §7
    /// for the miss/error distinction).
    pub(crate) fn resolve(
        &mut self,
        entry_index: usize,
        entry: &VdsDatasetEntry,
        host_file: &F,
        virtual_file_folder: &Path,
        access: &DatasetAccess,
    ) -> Result<Option<&DatasetInfo<F>>> {
        let key = (entry.source_file_name.clone(), entry.source_dataset.clone());
        if !self.cache.contains_key(&key) {
            let Some(info) = resolve_uncached(entry, host_file, virtual_file_folder, access)
                .map_err(|err| Error::downstream(Stage::Resolve { entry: entry_index }, err))?
            else {
                return Ok(None);
            };
            self.cache.insert(key.clone(), info);
        }
        Ok(self.cache.get(&key))
    }

    /// Releases every externally-opened source file, swallowing per-file
    /// close errors. The host file is never touched. Idempotent: a second
    /// call iterates an already-empty map.
    pub(crate) fn dispose(&mut self) {
        for (_, info) in self.cache.drain() {
            if let DatasetFile::Owned(file) = info.file
                && let Err(err) = file.close()
            {
                log_warn(&format!(
                    "vds: failed to close an externally-opened source file during disposal: {err}"
                ));
            }
        }
    }
}

fn resolve_uncached<F: VfsFile>(
    entry: &VdsDatasetEntry,
    host_file: &F,
    virtual_file_folder: &Path,
    access: &DatasetAccess,
) -> Result<Option<DatasetInfo<F>>> {
    if entry.is_self_referential() {
        if !host_file.link_exists(&entry.source_dataset) {
            return Ok(None);
        }
        let dataset = host_file.dataset(&entry.source_dataset)?;
        return Ok(Some(DatasetInfo {
            file: DatasetFile::Host,
            dataset,
            access: access.with_chunk_cache_or_default(),
        }));
    }

    let Some(path) = locate_source_file(&entry.source_file_name, virtual_file_folder, access)
    else {
        log_warn(&format!(
            "vds: source file '{}' could not be located; filling affected region",
            entry.source_file_name
        ));
        return Ok(None);
    };

    let file = F::open_read(&path)?;
    if !file.link_exists(&entry.source_dataset) {
        close_and_log(file);
        return Ok(None);
    }
    let dataset = match file.dataset(&entry.source_dataset) {
        Ok(dataset) => dataset,
        Err(err) => {
            close_and_log(file);
            return Err(err);
        }
    };
    Ok(Some(DatasetInfo {
        file: DatasetFile::Owned(file),
        dataset,
        access: access.with_chunk_cache_or_default(),
    }))
}

fn close_and_log<F: VfsFile>(file: F) {
    if let Err(err) = file.close() {
        log_warn(&format!("vds: failed to close a partially-resolved source file: {err}"));
    }
}

/// Path resolution order for an external `source_file_name` (component D,
/// step 2 / spec §6): (1) as-is if absolute, (2) `external_file_prefix` +
/// name, (3) the virtual file's folder + name. First existing path wins.
fn locate_source_file(name: &str, folder: &Path, access: &DatasetAccess) -> Option<PathBuf> {
    let as_is = Path::new(name);
    if as_is.is_absolute() && as_is.exists() {
        return Some(as_is.to_path_buf());
    }
    if let Some(prefix) = access.get_external_file_prefix() {
        let prefixed = Path::new(prefix).join(name);
        if prefixed.exists() {
            return Some(prefixed);
        }
    }
    let adjacent = folder.join(name);
    if adjacent.exists() { Some(adjacent) } else { None }
}
