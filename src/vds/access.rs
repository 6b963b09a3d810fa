//! Configuration surface exposed by the external interfaces (§6): dataset
//! access properties and chunk cache tuning, plus the open/owned file
//! handle discriminant used by the resolver and lifecycle components.

/// Per-source-dataset chunk cache parameters.
///
/// Field names and defaults mirror HDF5's own `H5Pget/set_chunk_cache`
/// property list entries: `nslots` is the number of chunk slots in the
/// cache's hash table, `nbytes` is the total cache size in bytes, and `w0`
/// is the preemption weighting between recently and frequently used chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkCache {
    pub nslots: usize,
    pub nbytes: usize,
    pub w0: f64,
}

impl Default for ChunkCache {
    fn default() -> Self {
        // HDF5 library defaults (H5D_CHUNK_CACHE_NSLOTS_DEFAULT et al).
        Self {
            nslots: 521,
            nbytes: 1_048_576,
            w0: 0.75,
        }
    }
}

/// Tunables consulted when the VDS resolver opens and reads a source
/// dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetAccess {
    chunk_cache: Option<ChunkCache>,
    external_file_prefix: Option<String>,
}

impl DatasetAccess {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn chunk_cache(mut self, cache: ChunkCache) -> Self {
        self.chunk_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn external_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.external_file_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn get_chunk_cache(&self) -> Option<ChunkCache> {
        self.chunk_cache
    }

    #[must_use]
    pub fn get_external_file_prefix(&self) -> Option<&str> {
        self.external_file_prefix.as_deref()
    }

    /// Returns a copy of this access struct with a chunk cache attached,
    /// allocating the default one if none was configured. Used by the
    /// resolver (component D, step 5) so that chunk reuse is scoped to a
    /// single resolved source dataset within one stream.
    #[must_use]
    pub(crate) fn with_chunk_cache_or_default(&self) -> Self {
        let mut clone = self.clone();
        clone.chunk_cache.get_or_insert_with(ChunkCache::default);
        clone
    }
}
