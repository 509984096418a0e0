//! The bin crate's error type (SPEC_FULL.md §1 "Errors"): `thiserror`
//! variants wrapping `x11rb`'s connection/reply errors, mirroring
//! `pgwm/src/error.rs`'s split between collaborator-error wrappers and a
//! couple of named conditions the teacher's own startup code detects.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error(transparent)]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error(transparent)]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error(transparent)]
    ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Nix(#[from] nix::Error),

    #[error("another window manager is already running on this display")]
    WmAlreadyRunning,

    #[error(transparent)]
    Core(#[from] fensterchef_core::error::Error),
}
