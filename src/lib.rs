//! Compress and decompress whole files through memory-mapped I/O, using the zlib, Zstandard or LZ4
//! formats.
//!
//! Version 0.2.0
//!
//! The input file is mapped read-only and the output file is mapped read-write. A codec (DEFLATE
//! through miniz_oxide, Zstandard through zstd, LZ4 frames through lz4_flex) is driven straight
//! from one mapping into the other. The compressed size of a file isn't known until it has been
//! compressed (and the decompressed size isn't known at all), so the output file is created at an
//! estimate, grown whenever the codec runs out of room, and finally truncated to the bytes actually
//! written. Pages both cursors have moved past are handed back to the kernel along the way.
//!
//! Basic usage is as follows:
//!
//! `$> mmap-deflate --level=9 test.txt test.txt.z`
//!
//! `$> mmap-inflate test.txt.z test.txt`
//!
//! `$> mmap-zstd-compress --level=19 test.txt test.txt.zst`
//!
//! `$> mmap-lz4-decompress test.txt.lz4 test.txt`
//!
//! The outputs are plain zlib streams, zstd frames and LZ4 frames, so the usual tools can read
//! them.
//!
pub mod codec;
pub mod compression;
pub mod error;
pub mod mapping;
pub mod tools;
pub mod transform;

pub use compression::{
    compress, compress_lz4, compress_zstd, decompress, decompress_lz4, decompress_zstd,
    DeflateOpts, InflateOpts, Lz4Opts, ZstdOpts,
};
pub use error::{Error, Result};
