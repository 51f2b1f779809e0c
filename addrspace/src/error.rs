use std::io;

use thiserror::Error;

/// Reasons a range of address space could not be reserved.
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("cannot reserve an empty range")]
    ZeroSize,
    #[error("{len} bytes can't be rounded up to a whole number of pages")]
    TooLarge { len: usize },
    #[error("the OS refused to reserve {len} bytes of address space: {source}")]
    Os {
        len: usize,
        #[source]
        source: io::Error,
    },
    #[error("unable to install the fault handler: {0}")]
    HandlerInstall(#[source] io::Error),
    #[error("too many fault-committed regions are alive at once")]
    RegistryFull,
}
