//! The compression module runs one file through a codec, from opening the input to removing a
//! failed output.
//!
//! Both directions share the same steps:
//! - Map the input read-only, and refuse an output that is the input under another name.
//! - Create the output at an estimated size and map it read-write.
//! - Drive the codec, growing the output whenever it fills up.
//! - Truncate the output to the bytes actually written, then release both files.
//!
//! If any step fails once the output exists, the partial output file is removed.
//!
//! - compress: file to zlib stream.
//! - decompress: zlib stream to file.
//! - zstd: file to Zstandard frame and back.
//! - lz4: file to LZ4 frame and back.
//! - session: the steps above, shared by all of them.
//!
pub mod compress;
pub mod decompress;
pub mod lz4;
mod session;
pub mod zstd;

pub use compress::{compress, DeflateOpts};
pub use decompress::{decompress, InflateOpts};
pub use lz4::{compress_lz4, decompress_lz4, Lz4Opts};
pub use zstd::{compress_zstd, decompress_zstd, ZstdOpts};
