use std::borrow::Cow;
use std::fmt;
use std::io;

/// Result type used across the VDS read engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type surfaced by the VDS read engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure opening or closing a source file.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The virtual dataset descriptor or its construction parameters are invalid.
    #[error("invalid virtual dataset configuration while processing {stage}: {details}")]
    Configuration { stage: Stage, details: Cow<'static, str> },

    /// A dimension extent equals the HDF5 "unlimited" sentinel, which this
    /// engine does not support for virtual datasets.
    #[error("virtual dimension {axis} is unlimited; unlimited-dimension virtual datasets are not supported")]
    UnlimitedDimension { axis: usize },

    /// Coordinate or linear-index arithmetic would overflow `u64`.
    #[error("coordinate arithmetic overflowed while processing {context}")]
    Overflow { context: Cow<'static, str> },

    /// An operation was requested that this engine does not support.
    #[error("unsupported operation: {details}")]
    Unsupported { details: Cow<'static, str> },

    /// The external `ReadVirtual` callback, or a call it made, failed.
    #[error("downstream read failed while processing {stage}: {source}")]
    Downstream {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A read was requested starting at or extending past the end of the
    /// virtual dataset's linear enumeration.
    #[error("requested {requested} element(s) but only {available} remain in the virtual dataset")]
    OutOfRange { requested: u64, available: u64 },
}

impl Error {
    #[must_use]
    pub fn downstream(stage: Stage, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Downstream {
            stage,
            source: Box::new(source),
        }
    }
}

/// Phase of the VDS engine that produced a given error, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building the `VdsDescriptor` / `VirtualReadStream`.
    Construct,
    /// Resolving a source file/dataset for a given entry.
    Resolve { entry: usize },
    /// Reading through the external `ReadVirtual` callback.
    Read { entry: usize },
    /// Disposing of cached source file handles.
    Close,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct => write!(f, "construction"),
            Self::Resolve { entry } => write!(f, "resolution of entry {entry}"),
            Self::Read { entry } => write!(f, "read through entry {entry}"),
            Self::Close => write!(f, "disposal"),
        }
    }
}
