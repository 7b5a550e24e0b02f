//! Zstandard adapters: wrap the zstd streaming context in the same step interface as DEFLATE.
//!
//! The decoder keeps going across concatenated frames until the input is used up, the way the
//! `zstd` tool does. Anything after the last frame that isn't a frame is reported as corruption.
//!
use std::fmt::{Display, Formatter};

use ::zstd::stream::raw::{CParameter, Decoder, Encoder, Operation, OutBuffer};
use ::zstd::zstd_safe;
use log::{debug, trace};

use super::{Codec, Step, StreamError};

/// zstd's own default level.
pub const DEFAULT_LEVEL: i32 = ::zstd::DEFAULT_COMPRESSION_LEVEL;

/// The zstd match finding strategies, from fastest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ZstdStrategy {
    Fast,
    Dfast,
    Greedy,
    Lazy,
    Lazy2,
    Btlazy2,
    Btopt,
    Btultra,
    Btultra2,
}

impl Display for ZstdStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ZstdStrategy::Fast => "fast",
            ZstdStrategy::Dfast => "dfast",
            ZstdStrategy::Greedy => "greedy",
            ZstdStrategy::Lazy => "lazy",
            ZstdStrategy::Lazy2 => "lazy2",
            ZstdStrategy::Btlazy2 => "btlazy2",
            ZstdStrategy::Btopt => "btopt",
            ZstdStrategy::Btultra => "btultra",
            ZstdStrategy::Btultra2 => "btultra2",
        };
        write!(f, "{}", name)
    }
}

impl From<ZstdStrategy> for zstd_safe::Strategy {
    fn from(strategy: ZstdStrategy) -> Self {
        match strategy {
            ZstdStrategy::Fast => zstd_safe::Strategy::ZSTD_fast,
            ZstdStrategy::Dfast => zstd_safe::Strategy::ZSTD_dfast,
            ZstdStrategy::Greedy => zstd_safe::Strategy::ZSTD_greedy,
            ZstdStrategy::Lazy => zstd_safe::Strategy::ZSTD_lazy,
            ZstdStrategy::Lazy2 => zstd_safe::Strategy::ZSTD_lazy2,
            ZstdStrategy::Btlazy2 => zstd_safe::Strategy::ZSTD_btlazy2,
            ZstdStrategy::Btopt => zstd_safe::Strategy::ZSTD_btopt,
            ZstdStrategy::Btultra => zstd_safe::Strategy::ZSTD_btultra,
            ZstdStrategy::Btultra2 => zstd_safe::Strategy::ZSTD_btultra2,
        }
    }
}

/// Smallest and largest level the linked zstd accepts. Negative levels trade ratio for speed.
pub fn level_range() -> (i32, i32) {
    let range = ::zstd::compression_level_range();
    (*range.start(), *range.end())
}

/// Upper bound on the size of a single zstd frame holding `input_size` bytes.
pub fn max_output_size(input_size: usize) -> usize {
    zstd_safe::compress_bound(input_size)
}

/// Incremental Zstandard compressor producing a single frame.
pub struct ZstdEncoder {
    raw: Encoder<'static>,
}

impl ZstdEncoder {
    /// Levels outside [`level_range`] are clamped. Without a strategy the level picks one.
    pub fn new(level: i32, strategy: Option<ZstdStrategy>) -> Result<Self, StreamError> {
        let (min, max) = level_range();
        let level = level.clamp(min, max);

        let mut raw = Encoder::new(level).map_err(StreamError::engine)?;
        if let Some(strategy) = strategy {
            raw.set_parameter(CParameter::Strategy(strategy.into()))
                .map_err(StreamError::engine)?;
        }
        debug!("zstd level {}, strategy {:?}", level, strategy);

        Ok(Self { raw })
    }
}

impl Codec for ZstdEncoder {
    fn name(&self) -> &'static str {
        "zstd-compress"
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step, StreamError> {
        if output.is_empty() {
            return Ok(Step::NeedsMoreOutput);
        }

        if !input.is_empty() {
            let status = self
                .raw
                .run_on_buffers(input, output)
                .map_err(StreamError::engine)?;
            if status.bytes_read == 0 && status.bytes_written == 0 {
                return Ok(Step::NeedsMoreOutput);
            }
            return Ok(Step::Progress {
                consumed: status.bytes_read,
                produced: status.bytes_written,
            });
        }

        // All input is in, so close the frame. The context may need several calls to drain.
        let mut out = OutBuffer::around(output);
        let left = self.raw.finish(&mut out, true).map_err(StreamError::engine)?;
        let produced = out.pos();
        trace!("zstd epilogue: wrote {}, {} left to flush", produced, left);

        if left == 0 {
            Ok(Step::Finished {
                consumed: 0,
                produced,
            })
        } else if produced == 0 {
            Ok(Step::NeedsMoreOutput)
        } else {
            Ok(Step::Progress {
                consumed: 0,
                produced,
            })
        }
    }
}

/// Incremental Zstandard decompressor.
pub struct ZstdDecoder {
    raw: Decoder<'static>,
    /// Between frames: nothing buffered, nothing owed. True before the first frame too.
    idle: bool,
}

impl ZstdDecoder {
    pub fn new() -> Result<Self, StreamError> {
        let raw = Decoder::new().map_err(StreamError::engine)?;
        Ok(Self { raw, idle: true })
    }
}

impl Codec for ZstdDecoder {
    fn name(&self) -> &'static str {
        "zstd-decompress"
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step, StreamError> {
        // An empty file decompresses to an empty file, and so does the end of the last frame.
        if input.is_empty() && self.idle {
            return Ok(Step::Finished {
                consumed: 0,
                produced: 0,
            });
        }
        if output.is_empty() {
            return Ok(Step::NeedsMoreOutput);
        }

        let status = self
            .raw
            .run_on_buffers(input, output)
            .map_err(StreamError::decoding)?;
        let consumed = status.bytes_read;
        let produced = status.bytes_written;
        // A zero hint means a frame just ended and everything it held was written out.
        self.idle = status.remaining == 0;

        if self.idle && consumed == input.len() {
            return Ok(Step::Finished { consumed, produced });
        }
        if input.is_empty() && produced == 0 {
            return Err(StreamError::Truncated);
        }
        Ok(Step::Progress { consumed, produced })
    }
}
