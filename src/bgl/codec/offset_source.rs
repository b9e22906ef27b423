//! A seekable window over a file, starting at a fixed offset.
//!
//! The gzip member embedded in a BGL file starts after the container
//! signature. Wrapping the file in an [`OffsetSource`] lets the gzip layer
//! address the member as if it were a standalone file: position 0 is the
//! first byte of the gzip header.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::trace;

/// Read/seek view of `inner` that hides the first `offset` bytes.
///
/// Seek semantics:
/// - `SeekFrom::Start(pos)` lands on `offset + pos`.
/// - `SeekFrom::Current(delta)` is clamped so it never moves before `offset`.
/// - `SeekFrom::End(delta)` is passed through unchanged.
///
/// Reported positions are relative to `offset`.
#[derive(Debug)]
pub struct OffsetSource<R = File> {
    inner: R,
    offset: u64,
}

impl OffsetSource<File> {
    /// Opens `path` and positions the window at `offset`.
    pub fn open(path: impl AsRef<Path>, offset: u64) -> io::Result<Self> {
        Self::new(File::open(path)?, offset)
    }
}

impl<R: Read + Seek> OffsetSource<R> {
    pub fn new(mut inner: R, offset: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(offset))?;
        trace!("Offset source positioned at {:#X}", offset);
        Ok(Self { inner, offset })
    }

    /// Offset of the window inside the underlying source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for OffsetSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for OffsetSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let absolute = match pos {
            SeekFrom::Start(p) => self.inner.seek(SeekFrom::Start(self.offset.saturating_add(p)))?,
            SeekFrom::Current(delta) => {
                let current = self.inner.stream_position()?;
                let target = current.saturating_add_signed(delta).max(self.offset);
                self.inner.seek(SeekFrom::Start(target))?
            }
            SeekFrom::End(delta) => self.inner.seek(SeekFrom::End(delta))?,
        };
        Ok(absolute.saturating_sub(self.offset))
    }
}
