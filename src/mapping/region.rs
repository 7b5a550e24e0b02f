//! File backed mappings for mmap-deflate.
//!
//! An InputRegion is a read-only view of a whole file. An OutputRegion is a read-write view of a
//! file we created ourselves, and it is the only thing in the crate that changes a file's length.
//!
//! Both keep their mapping in an Option. A region whose mapping is gone (released, shrunk, or left
//! behind by a grow that failed half way) is still a valid value: it hands out empty slices and
//! releasing it again does nothing.
//!
//! Pages behind the read and write cursors are handed back with `MADV_DONTNEED` as the transform
//! moves on. Both mappings are shared mappings of regular files, so a released page is read back
//! from the page cache if it is ever touched again.
//!
use std::cell::Cell;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::ops::{Deref, Range};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use memmap2::{Advice, Mmap, MmapMut, MmapOptions, UncheckedAdvice};

use super::{releasable, InputBuffer, MapError, OutputBuffer};

/// rw-r--r--, same as the files a shell redirect would create.
const OUTPUT_FILE_MODE: u32 = 0o644;

/// A whole file mapped read-only.
#[derive(Debug)]
pub struct InputRegion {
    path: PathBuf,
    mmap: Option<Mmap>,
    file: Option<File>,
    /// Device and inode of the file, used to spot an output that would overwrite us.
    id: (u64, u64),
    /// Pages before this offset were given back.
    released: Cell<usize>,
}

impl InputRegion {
    /// Open `path` and map all of it. An empty file gives an empty region.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|source| MapError::Open {
            path: path.clone(),
            source,
        })?;
        let metadata = file.metadata().map_err(|source| MapError::Stat {
            path: path.clone(),
            source,
        })?;
        let len = usize::try_from(metadata.len()).map_err(|_| MapError::TooLarge {
            path: path.clone(),
            len: metadata.len(),
        })?;

        let mmap = unsafe { MmapOptions::new().len(len).map(&file) }.map_err(|source| {
            MapError::Map {
                path: path.clone(),
                source,
            }
        })?;
        advise_sequential(&path, mmap.advise(Advice::Sequential));

        debug!("Mapped {} bytes of input from {}", len, path.display());
        Ok(Self {
            path,
            mmap: Some(mmap),
            file: Some(file),
            id: (metadata.dev(), metadata.ino()),
            released: Cell::new(0),
        })
    }

    /// The mapped bytes. Empty once released.
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// True if `other` names the file we have mapped (through any path or hard link).
    /// A path that can't be inspected is treated as a different file.
    pub fn is_same_file<P: AsRef<Path>>(&self, other: P) -> bool {
        match fs::metadata(other.as_ref()) {
            Ok(metadata) => (metadata.dev(), metadata.ino()) == self.id,
            Err(_) => false,
        }
    }

    /// Give back the pages before `offset`, a whole span at a time. Returns the number of bytes
    /// released by this call. A refusal from the kernel is logged and otherwise ignored.
    pub fn release_before(&self, offset: usize) -> usize {
        let mmap = match &self.mmap {
            Some(mmap) => mmap,
            None => return 0,
        };
        let span = match releasable(self.released.get(), offset.min(mmap.len())) {
            Some(span) => span,
            None => return 0,
        };

        // SAFETY: the mapping is a read-only shared mapping of a regular file. Dropped pages
        // are faulted back in from the file with the same contents.
        let advised = unsafe {
            mmap.unchecked_advise_range(UncheckedAdvice::DontNeed, span.start, span.len())
        };
        release_result(&self.path, &span, advised);
        self.released.set(span.end);
        span.len()
    }

    /// Unmap and close. Calling it again is harmless.
    pub fn release(&mut self) {
        if self.mmap.take().is_some() {
            trace!("Released input mapping of {}", self.path.display());
        }
        self.file = None;
    }
}

impl InputBuffer for InputRegion {
    fn bytes(&self) -> &[u8] {
        self.as_slice()
    }

    fn release_before(&self, offset: usize) {
        InputRegion::release_before(self, offset);
    }
}

impl Deref for InputRegion {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// A file we created, mapped read-write. Its length can grow while data is written into it.
#[derive(Debug)]
pub struct OutputRegion {
    path: PathBuf,
    mmap: Option<MmapMut>,
    file: Option<File>,
    /// Length of the file on disk.
    len: usize,
    /// Pages before this offset were given back. Survives a grow, since the new mapping starts
    /// with nothing resident.
    released: usize,
}

impl OutputRegion {
    /// Create (or truncate) `path`, size it to `initial_len` bytes and map it.
    ///
    /// If the file was opened but could not be sized or mapped, it is removed again before the
    /// error is returned, since truncating it already destroyed whatever it held.
    pub fn create<P: AsRef<Path>>(path: P, initial_len: usize) -> Result<Self, MapError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(OUTPUT_FILE_MODE)
            .open(&path)
            .map_err(|source| MapError::Create {
                path: path.clone(),
                source,
            })?;

        let mut region = Self {
            path,
            mmap: None,
            file: Some(file),
            len: 0,
            released: 0,
        };

        if let Err(e) = region.map_at(initial_len) {
            region.file = None;
            if let Err(rm) = fs::remove_file(&region.path) {
                warn!("couldn't remove file '{}': {}", region.path.display(), rm);
            }
            return Err(e);
        }

        debug!(
            "Created {} with an initial capacity of {} bytes",
            region.path.display(),
            initial_len
        );
        Ok(region)
    }

    /// Unmap, extend the file to `new_len` bytes and map it again.
    ///
    /// On failure the region is left unmapped. It can still be released safely.
    pub fn grow(&mut self, new_len: usize) -> Result<(), MapError> {
        if new_len < self.len {
            return Err(MapError::InvalidLength {
                path: self.path.clone(),
                current: self.len,
                requested: new_len,
            });
        }

        // The old mapping has to go before the file changes underneath it.
        self.mmap = None;
        self.map_at(new_len)?;

        trace!("Grew {} to {} bytes", self.path.display(), new_len);
        Ok(())
    }

    /// Give back the written pages before `offset`, a whole span at a time. Returns the number of
    /// bytes released by this call. A refusal from the kernel is logged and otherwise ignored.
    pub fn release_before(&mut self, offset: usize) -> usize {
        let mmap = match &self.mmap {
            Some(mmap) => mmap,
            None => return 0,
        };
        let span = match releasable(self.released, offset.min(mmap.len())) {
            Some(span) => span,
            None => return 0,
        };

        // SAFETY: the mapping is a shared mapping of a regular file, so written pages stay in the
        // page cache and are faulted back in unchanged. No slice into the mapping is alive while
        // we hold it mutably.
        let advised = unsafe {
            mmap.unchecked_advise_range(UncheckedAdvice::DontNeed, span.start, span.len())
        };
        release_result(&self.path, &span, advised);
        self.released = span.end;
        span.len()
    }

    /// Flush and unmap, then truncate the file to `final_len` bytes.
    pub fn shrink_to(&mut self, final_len: usize) -> Result<(), MapError> {
        if final_len > self.len {
            return Err(MapError::InvalidLength {
                path: self.path.clone(),
                current: self.len,
                requested: final_len,
            });
        }

        self.flush()?;
        self.mmap = None;

        let file = self.file.as_ref().ok_or_else(|| MapError::Released {
            path: self.path.clone(),
        })?;
        file.set_len(final_len as u64)
            .map_err(|source| MapError::Resize {
                path: self.path.clone(),
                len: final_len,
                source,
            })?;
        self.len = final_len;

        debug!("Truncated {} to {} bytes", self.path.display(), final_len);
        Ok(())
    }

    /// Flush, unmap and close. Calling it again (or after a failed grow) is harmless.
    pub fn release(&mut self) -> Result<(), MapError> {
        let flushed = self.flush();
        self.mmap = None;
        self.file = None;
        flushed
    }

    fn flush(&self) -> Result<(), MapError> {
        match &self.mmap {
            Some(mmap) => mmap.flush().map_err(|source| MapError::Flush {
                path: self.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Set the file length to `len` and map all of it. Expects no live mapping.
    fn map_at(&mut self, len: usize) -> Result<(), MapError> {
        let file = self.file.as_ref().ok_or_else(|| MapError::Released {
            path: self.path.clone(),
        })?;

        file.set_len(len as u64).map_err(|source| MapError::Resize {
            path: self.path.clone(),
            len,
            source,
        })?;
        self.len = len;

        let mmap = unsafe { MmapOptions::new().len(len).map_mut(file) }.map_err(|source| {
            MapError::Map {
                path: self.path.clone(),
                source,
            }
        })?;
        advise_sequential(&self.path, mmap.advise(Advice::Sequential));

        self.mmap = Some(mmap);
        Ok(())
    }
}

impl OutputBuffer for OutputRegion {
    fn capacity(&self) -> usize {
        self.mmap.as_ref().map_or(0, |mmap| mmap.len())
    }

    fn window(&mut self) -> &mut [u8] {
        self.mmap.as_deref_mut().unwrap_or(&mut [])
    }

    fn grow(&mut self, new_capacity: usize) -> Result<(), MapError> {
        OutputRegion::grow(self, new_capacity)
    }

    fn release_before(&mut self, offset: usize) {
        OutputRegion::release_before(self, offset);
    }
}

/// The hint only helps the kernel's read-ahead, so a refusal is not worth more than a debug line.
fn advise_sequential(path: &Path, result: io::Result<()>) {
    if let Err(e) = result {
        debug!(
            "Couldn't advise sequential access for {}: {}",
            path.display(),
            e
        );
    }
}

/// Releasing pages early only saves memory. A refusal is not worth more than a debug line.
fn release_result(path: &Path, span: &Range<usize>, result: io::Result<()>) {
    match result {
        Ok(()) => trace!(
            "Released bytes {}..{} of {}",
            span.start,
            span.end,
            path.display()
        ),
        Err(e) => debug!(
            "Couldn't release bytes {}..{} of {}: {}",
            span.start,
            span.end,
            path.display(),
            e
        ),
    }
}
