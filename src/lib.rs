//! A dependency-free HDF5 Virtual Dataset (VDS) read engine.
//!
//! This crate owns the coordinate arithmetic, hyperslab selection algebra,
//! mapping-table model, source resolution, and read-stream lifecycle needed
//! to serve reads against a virtual dataset. It never parses HDF5 bytes
//! itself: object-header decoding, the global heap, and concrete dataset
//! I/O are supplied by a containing reader through the [`vds::VfsFile`] and
//! [`vds::ReadVirtual`] traits.

pub mod coords;
pub mod error;
pub mod logger;
pub mod selection;
pub mod vds;

pub use error::{Error, Result, Stage};
pub use selection::{HyperslabSelection, LinearLookup};
pub use vds::{
    ChunkCache, DatasetAccess, DatasetInfo, DelegateSelection, ReadVirtual, SELF_FILE, VdsDatasetEntry,
    VdsDescriptor, VfsFile, VirtualReadStream,
};
