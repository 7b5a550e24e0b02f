//! The mapping module owns the memory-mapped files that mmap-deflate reads from and writes to.
//!
//! Input files are mapped read-only at their full length. Output files are created at an estimated
//! size and mapped read-write. The output size is rarely known up front, so an output mapping can be
//! grown (unmap, resize the file, remap) and finally shrunk to the number of bytes actually written.
//!
//! The transform driver does not care that its output lives in a file. It only needs something that
//! hands out a mutable window and can be made bigger, which is the [`OutputBuffer`] trait, and
//! something to read from, which is the [`InputBuffer`] trait.
//!
//! Both traits also let the driver say how far it got. File backed regions use that to hand pages
//! that will not be touched again back to the kernel, in spans of [`RELEASE_SPAN`] bytes, so a
//! large file does not stay resident for the whole run.
//!
//! - region: InputRegion and OutputRegion, the file backed mappings.
//!
pub mod region;

use std::io;
use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

pub use region::{InputRegion, OutputRegion};

/// Consumed pages are released in multiples of this many bytes.
pub const RELEASE_SPAN: usize = 1 << 16;

/// Errors raised while opening, sizing, mapping or releasing a file.
///
/// Every variant keeps the path involved and the underlying OS error, so the diagnostic line can
/// show both.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("couldn't open file '{}' for reading: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't stat file '{}': {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't create file '{}' for writing: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't set length of file '{}' to '{len}': {source}", .path.display())]
    Resize {
        path: PathBuf,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("couldn't map file '{}' into memory: {source}", .path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't flush file '{}' to disk: {source}", .path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't remove file '{}': {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file '{}' is too large to map ({len} bytes)", .path.display())]
    TooLarge { path: PathBuf, len: u64 },

    #[error("can't resize mapping of file '{}' from {current} to {requested} bytes", .path.display())]
    InvalidLength {
        path: PathBuf,
        current: usize,
        requested: usize,
    },

    #[error("file '{}' was already released", .path.display())]
    Released { path: PathBuf },
}

impl MapError {
    /// The OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            MapError::Open { source, .. }
            | MapError::Stat { source, .. }
            | MapError::Create { source, .. }
            | MapError::Resize { source, .. }
            | MapError::Map { source, .. }
            | MapError::Flush { source, .. }
            | MapError::Remove { source, .. } => source.raw_os_error(),
            MapError::TooLarge { .. }
            | MapError::InvalidLength { .. }
            | MapError::Released { .. } => None,
        }
    }
}

/// An output window that can be enlarged while a transform is running.
///
/// Calling `grow` invalidates every slice previously handed out by `window`. The borrow checker
/// enforces that: a window borrows the buffer mutably, so it must be dropped before `grow` is called,
/// and a fresh one taken afterwards.
pub trait OutputBuffer {
    /// Number of bytes currently writable.
    fn capacity(&self) -> usize;

    /// The whole writable area, `capacity()` bytes long.
    fn window(&mut self) -> &mut [u8];

    /// Enlarge the buffer to `new_capacity` bytes. Existing contents are preserved.
    fn grow(&mut self, new_capacity: usize) -> Result<(), MapError>;

    /// Everything before `offset` is written and will not be touched again. Contents are kept, the
    /// buffer may only drop its own copy of them.
    fn release_before(&mut self, _offset: usize) {}
}

/// Bytes a transform reads from.
pub trait InputBuffer {
    fn bytes(&self) -> &[u8];

    /// Everything before `offset` has been consumed and will not be read again.
    fn release_before(&self, _offset: usize) {}
}

impl InputBuffer for [u8] {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> InputBuffer for [u8; N] {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl InputBuffer for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
}

/// The whole spans between `released` and `offset` that can be given back.
///
/// The span holding the byte just before `offset` is kept, so a cursor sitting exactly on a span
/// boundary leaves the span behind it alone until it moves on.
pub(crate) fn releasable(released: usize, offset: usize) -> Option<Range<usize>> {
    let end = offset.saturating_sub(1) / RELEASE_SPAN * RELEASE_SPAN;
    if end > released {
        Some(released..end)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn releasable_test() {
        assert_eq!(releasable(0, 0), None);
        assert_eq!(releasable(0, RELEASE_SPAN), None);
        assert_eq!(releasable(0, RELEASE_SPAN + 1), Some(0..RELEASE_SPAN));
        assert_eq!(releasable(0, 3 * RELEASE_SPAN + 7), Some(0..3 * RELEASE_SPAN));
        assert_eq!(
            releasable(RELEASE_SPAN, 3 * RELEASE_SPAN + 7),
            Some(RELEASE_SPAN..3 * RELEASE_SPAN)
        );
        assert_eq!(releasable(3 * RELEASE_SPAN, 3 * RELEASE_SPAN + 7), None);
    }

    #[test]
    fn slice_input_test() {
        let bytes = *b"abc";
        assert_eq!(bytes.bytes(), b"abc");
        assert_eq!(b"abc".to_vec().bytes(), b"abc");
        assert_eq!(bytes[1..].bytes(), b"bc");
        // Nothing to give back for plain memory
        bytes.release_before(2);
    }
}
