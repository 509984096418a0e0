//! The crate-wide error type.
//!
//! Mirrors the teacher's split between "this is a bug" variants and
//! `#[error(transparent)]` wrappers around collaborator errors -- except
//! that this crate has no X11 connection of its own, so the only
//! collaborator errors it wraps are I/O (reading a configuration or
//! sourced file) and the ones produced by the `Display` facade.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Display(String),

    #[error("frame {0:?} does not exist or was freed")]
    UnknownFrame(crate::ids::FrameId),

    #[error("window {0:?} does not exist or was freed")]
    UnknownWindow(crate::ids::WindowId),

    #[error("monitor {0:?} does not exist or was freed")]
    UnknownMonitor(crate::ids::MonitorId),

    #[error("invariant violated: {0}")]
    Invariant(&'static str),

    #[error("no group named {0:?}")]
    UnknownGroup(String),

    #[error("no such monitor matches {0:?}")]
    NoMatchingMonitor(String),

    #[error("alias table is full (capacity {0})")]
    AliasTableFull(usize),

    #[error("group table is full (capacity {0})")]
    GroupTableFull(usize),
}

impl Error {
    pub fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
