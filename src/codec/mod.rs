//! The codec module adapts the compression engines to the transform driver.
//!
//! DEFLATE (miniz_oxide) and Zstandard are incremental state machines: they are handed some input
//! and some room for output, do as much as they can, and report how much of each they used. Their
//! adapters expose exactly that as a single `step` call, so the driver never has to know which
//! direction it is running.
//!
//! The LZ4 frame engine only speaks `Read` and `Write`, so its adapters implement [`PipeCodec`]
//! instead and are driven by [`pipe`](crate::transform::pipe).
//!
//! - bound: worst case compressed size for a given input size.
//! - deflate: compression adapter (zlib stream, level and strategy).
//! - inflate: decompression adapter.
//! - zstd: Zstandard compression and decompression adapters.
//! - lz4: LZ4 frame compression and decompression adapters.
//!
pub mod bound;
pub mod deflate;
pub mod inflate;
pub mod lz4;
pub mod zstd;

use std::io::{self, Read, Write};

use miniz_oxide::{MZError, MZStatus};
use thiserror::Error;

pub use bound::max_output_size;
pub use deflate::{DeflateCodec, Strategy};
pub use inflate::InflateCodec;
pub use lz4::{Lz4Decoder, Lz4Encoder};
pub use zstd::{ZstdDecoder, ZstdEncoder};

/// Result of one codec step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Some input was consumed and/or some output produced. The stream is not done.
    Progress { consumed: usize, produced: usize },
    /// The end of the stream was reached during this step.
    Finished { consumed: usize, produced: usize },
    /// No room left to write into. Grow the output and repeat the step with the same input.
    NeedsMoreOutput,
}

/// One step of an incremental transform over caller provided windows.
///
/// `input` is everything not yet consumed, `output` is all the room left. The codec must never
/// report more consumed or produced bytes than those slices hold.
pub trait Codec {
    /// Name used in diagnostics, e.g. "deflate".
    fn name(&self) -> &'static str;

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step, StreamError>;
}

/// A codec that pulls all of its input from a reader and pushes all of its output into a writer.
pub trait PipeCodec {
    /// Name used in diagnostics, e.g. "lz4-compress".
    fn name(&self) -> &'static str;

    /// Run the whole stream. Returns once `input` is exhausted and everything has been written.
    fn pipe(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), StreamError>;
}

/// Unrecoverable stream failures. `code` is the zlib style return code reported by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("input data corrupted ({code})")]
    Corrupt { code: i32 },

    #[error("input ended before the end of the compressed stream")]
    Truncated,

    #[error("dictionary needed ({code})")]
    NeedDict { code: i32 },

    #[error("out of memory ({code})")]
    OutOfMemory { code: i32 },

    #[error("{what} ({code})")]
    Internal { what: &'static str, code: i32 },

    #[error("input data corrupted: {0}")]
    Malformed(String),

    #[error("{0}")]
    Engine(String),
}

impl StreamError {
    /// True for damaged or incomplete input, as opposed to a fault in the codec itself.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StreamError::Corrupt { .. } | StreamError::Truncated | StreamError::Malformed(_)
        )
    }

    /// Classify an error a decoder reported through `std::io`. Whatever it is, the input is to
    /// blame.
    pub(crate) fn decoding(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => StreamError::Truncated,
            _ => StreamError::Malformed(e.to_string()),
        }
    }

    /// An error reported through `std::io` that has nothing to do with the input.
    pub(crate) fn engine(e: io::Error) -> Self {
        StreamError::Engine(e.to_string())
    }

    fn need_dict() -> Self {
        StreamError::NeedDict {
            code: MZStatus::NeedDict as i32,
        }
    }
}

impl From<MZError> for StreamError {
    fn from(e: MZError) -> Self {
        let code = e as i32;
        match e {
            MZError::Data => StreamError::Corrupt { code },
            MZError::Mem => StreamError::OutOfMemory { code },
            MZError::Buf => StreamError::Internal {
                what: "no progress possible",
                code,
            },
            MZError::Stream => StreamError::Internal {
                what: "inconsistent stream state",
                code,
            },
            MZError::Version => StreamError::Internal {
                what: "codec library version mismatch",
                code,
            },
            MZError::Param => StreamError::Internal {
                what: "invalid codec parameter",
                code,
            },
            MZError::ErrNo => StreamError::Internal {
                what: "codec I/O error",
                code,
            },
        }
    }
}

/// Deterministic, incompressible looking bytes for tests.
#[cfg(test)]
pub(crate) fn noise(len: usize, mut seed: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        // xorshift64
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        out.push((seed >> 24) as u8);
    }
    out
}
