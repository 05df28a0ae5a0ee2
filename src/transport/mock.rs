//! In-memory transport for tests.

use super::Transport;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Mock transport: a shared pair of buffers. Clones talk to the same
/// buffers, so a test can keep one handle while the pipeline owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Buffers>>,
}

#[derive(Default)]
struct Buffers {
    incoming: VecDeque<u8>,
    outgoing: Vec<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the device-under-test to read.
    pub fn push_incoming(&self, data: &[u8]) {
        self.inner.lock().incoming.extend(data);
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().outgoing.clone()
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        let n = inner.incoming.len().min(buffer.len());
        for slot in buffer.iter_mut().take(n) {
            *slot = inner.incoming.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner.lock().outgoing.extend_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_drains_incoming() {
        let mock = MockTransport::new();
        mock.push_incoming(&[1, 2, 3]);

        let mut handle = mock.clone();
        let mut buf = [0u8; 2];
        assert_eq!(handle.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(handle.read(&mut buf).unwrap(), 1);
        assert_eq!(handle.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_writes_visible_through_clone() {
        let mock = MockTransport::new();
        mock.clone().write_all(&[9, 8]).unwrap();
        assert_eq!(mock.written(), vec![9, 8]);
    }
}
