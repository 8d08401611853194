//! Guest linear memory string decoding
//!
//! Host ABI functions receive pointers into the guest's linear memory and
//! need to turn them into text. Two forms are supported:
//!
//! - NUL-terminated strings, found by scanning forward from the pointer
//! - Explicit (pointer, length) runs, read exactly as given
//!
//! All access is read-only and bounds-checked. An offset or length that
//! leaves the buffer is an error, never a silently truncated string.

use thiserror::Error;

/// Errors raised while reading text out of linear memory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The guest called into the host before memory was bound
    #[error("linear memory is not bound")]
    Unbound,
    /// The requested range does not fit in the buffer
    #[error("out of bounds memory access: offset {offset}, length {len}, memory size {size}")]
    OutOfBounds { offset: u64, len: u64, size: usize },
    /// A terminator scan reached the end of memory
    #[error("unterminated string at offset {offset}, memory size {size}")]
    Unterminated { offset: u64, size: usize },
}

/// A (pointer, length) view into linear memory
///
/// Views are produced and consumed within a single host call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestStr {
    pub ptr: u64,
    pub len: u64,
}

impl GuestStr {
    pub fn new(ptr: u64, len: u64) -> Self {
        Self { ptr, len }
    }
}

/// Read-only view over the bytes of a guest's linear memory
#[derive(Debug, Clone, Copy)]
pub struct LinearMemory<'a> {
    bytes: &'a [u8],
}

impl<'a> LinearMemory<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Current size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Validate an explicit (pointer, length) run
    pub fn view(&self, ptr: u64, len: u64) -> Result<GuestStr, MemoryError> {
        self.range(ptr, len)?;
        Ok(GuestStr::new(ptr, len))
    }

    /// Locate a NUL-terminated string starting at `ptr`
    ///
    /// The terminator is not part of the returned view.
    pub fn c_str_view(&self, ptr: u64) -> Result<GuestStr, MemoryError> {
        let size = self.size();
        let start = usize::try_from(ptr)
            .ok()
            .filter(|&start| start <= size)
            .ok_or(MemoryError::OutOfBounds { offset: ptr, len: 1, size })?;

        match self.bytes[start..].iter().position(|&b| b == 0) {
            Some(len) => Ok(GuestStr::new(ptr, len as u64)),
            None => Err(MemoryError::Unterminated { offset: ptr, size }),
        }
    }

    /// Decode a view as UTF-8, replacing invalid sequences with U+FFFD
    pub fn decode(&self, view: GuestStr) -> Result<String, MemoryError> {
        let range = self.range(view.ptr, view.len)?;
        Ok(String::from_utf8_lossy(&self.bytes[range]).into_owned())
    }

    /// Read exactly `len` bytes at `ptr` as text
    pub fn read_str(&self, ptr: u64, len: u64) -> Result<String, MemoryError> {
        self.decode(self.view(ptr, len)?)
    }

    /// Read the NUL-terminated string at `ptr` as text
    pub fn read_c_str(&self, ptr: u64) -> Result<String, MemoryError> {
        self.decode(self.c_str_view(ptr)?)
    }

    fn range(&self, ptr: u64, len: u64) -> Result<std::ops::Range<usize>, MemoryError> {
        let size = self.size();
        let oob = MemoryError::OutOfBounds { offset: ptr, len, size };
        let start = usize::try_from(ptr).map_err(|_| oob.clone())?;
        let len = usize::try_from(len).map_err(|_| oob.clone())?;
        let end = start.checked_add(len).ok_or_else(|| oob.clone())?;
        if end > size {
            return Err(oob);
        }
        Ok(start..end)
    }
}

/// Read a NUL-terminated string from memory that may not be bound yet
pub fn read_c_string(memory: Option<LinearMemory<'_>>, ptr: u64) -> Result<String, MemoryError> {
    memory.ok_or(MemoryError::Unbound)?.read_c_str(ptr)
}

/// Read a length-delimited string from memory that may not be bound yet
pub fn read_string(memory: Option<LinearMemory<'_>>, ptr: u64, len: u64) -> Result<String, MemoryError> {
    memory.ok_or(MemoryError::Unbound)?.read_str(ptr, len)
}
