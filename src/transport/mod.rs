//! Byte-transport abstraction over the serial links.

use crate::error::Result;

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// A byte stream to a device.
///
/// `read` may return fewer bytes than requested, including zero when no
/// data arrived within the transport's timeout; callers accumulate fixed
/// records themselves so that a shutdown flag can be checked between
/// partial reads.
pub trait Transport: Send {
    /// Read available bytes into `buffer`, returning the count. Zero means
    /// no data arrived before the timeout.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write all of `data`.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
}
