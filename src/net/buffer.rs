//! Per-connection read buffer.

/// Fixed-capacity byte region reused for every read on one connection.
///
/// The region is zeroed before each read and a read fills at most
/// `capacity - 1` bytes, so the last byte is always zero and every chunk is
/// NUL-terminated inside the buffer.
#[derive(Debug)]
pub struct ReadBuffer {
    data: Box<[u8]>,
}

impl ReadBuffer {
    /// Smallest capacity that still leaves one byte to read into.
    pub const MIN_CAPACITY: usize = 2;

    /// Allocate a zeroed buffer. Capacities below [`Self::MIN_CAPACITY`] are raised to it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(Self::MIN_CAPACITY)].into_boxed_slice(),
        }
    }

    /// Total size of the region.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Largest number of bytes a single read may fill.
    pub fn max_read(&self) -> usize {
        self.data.len() - 1
    }

    /// Zero the region and return the slice the next read should fill.
    pub fn prepare(&mut self) -> &mut [u8] {
        self.data.fill(0);
        let max = self.max_read();
        &mut self.data[..max]
    }

    /// The first `n` bytes, as filled by the last read.
    pub fn filled(&self, n: usize) -> &[u8] {
        &self.data[..n.min(self.max_read())]
    }
}
