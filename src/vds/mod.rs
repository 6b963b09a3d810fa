//! The virtual dataset engine: descriptor model, external interfaces,
//! source resolution, and the read stream built from all of them.

pub mod access;
pub mod delegate;
pub mod descriptor;
pub mod resolver;
pub mod stream;
pub mod traits;

pub use access::{ChunkCache, DatasetAccess};
pub use delegate::DelegateSelection;
pub use descriptor::{SELF_FILE, VdsDatasetEntry, VdsDescriptor};
pub use resolver::DatasetInfo;
pub use stream::VirtualReadStream;
pub use traits::{ReadVirtual, VfsFile};
