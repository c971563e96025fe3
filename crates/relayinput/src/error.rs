use std::io;

use thiserror::Error;

/// Convenient result type for the relay crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for virtual keyboard emission.
#[derive(Debug, Error)]
pub enum Error {
    /// Creating the uinput device failed. Typically a permission problem:
    /// the process must run as root or belong to the `input` group.
    #[error("failed to create virtual input device: {0}")]
    DeviceCreate(#[source] io::Error),

    /// The device failed to open earlier in this process; the emission path
    /// stays down until restart.
    #[error("virtual input device unavailable")]
    Unavailable,

    /// Writing an input event to the device failed.
    #[error("failed to write input event: {0}")]
    EventWrite(#[source] io::Error),
}
