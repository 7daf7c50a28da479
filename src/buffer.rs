/*!
 * Buffer
 *
 * Reference-counted growable byte buffer: the crate's own first client
 * of the ownership capability. Writes past the end grow the buffer;
 * reads past the end are refused.
 */

use crate::handle::{RefCount, RefCounted};
use bytes::BytesMut;

pub struct Buffer {
    count: RefCount,
    data: BytesMut,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            count: RefCount::new(),
            data: BytesMut::new(),
        }
    }

    /// A zero-filled buffer of `size` bytes
    pub fn with_size(size: usize) -> Self {
        Self {
            count: RefCount::new(),
            data: BytesMut::zeroed(size),
        }
    }

    /// A buffer holding a copy of `data`
    pub fn copy_from(data: &[u8]) -> Self {
        Self {
            count: RefCount::new(),
            data: BytesMut::from(data),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite the whole buffer with zeroes
    pub fn zero(&mut self) {
        self.data.fill(0);
    }

    /// Copy `bytes` into the buffer at `offset`, growing it to fit
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);
    }

    /// Borrow `len` bytes starting at `offset`, if in range
    pub fn read(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }
}

impl RefCounted for Buffer {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

// Value equality compares contents only; handle identity is separate.
impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Buffer {}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("len", &self.len()).finish()
    }
}
