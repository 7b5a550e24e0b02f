//! Compression adapter: wraps miniz_oxide's deflate stream and produces a zlib stream.
//!
//! The engine is only told to finish once the room left is at least the worst case size of the
//! input left (or once there is no input left). Until then it runs without flushing.
//!
use std::fmt::{Display, Formatter};

use log::{debug, trace};
use miniz_oxide::deflate::core::{
    create_comp_flags_from_zip_params, CompressionStrategy, CompressorOxide,
};
use miniz_oxide::deflate::stream::deflate;
use miniz_oxide::{MZError, MZFlush, MZStatus};

use super::bound::max_output_size;
use super::{Codec, Step, StreamError};

/// zlib's default level.
pub const DEFAULT_LEVEL: u8 = 6;
pub const MAX_LEVEL: u8 = 9;
/// Positive window bits select the zlib wrapper; 15 is the largest (32 KiB) window.
const WINDOW_BITS: i32 = 15;

/// The zlib compression strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    #[default]
    Default,
    Filtered,
    HuffmanOnly,
    Rle,
    Fixed,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::Default => "default",
            Strategy::Filtered => "filtered",
            Strategy::HuffmanOnly => "huffman-only",
            Strategy::Rle => "rle",
            Strategy::Fixed => "fixed",
        };
        write!(f, "{}", name)
    }
}

impl From<Strategy> for CompressionStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Default => CompressionStrategy::Default,
            Strategy::Filtered => CompressionStrategy::Filtered,
            Strategy::HuffmanOnly => CompressionStrategy::HuffmanOnly,
            Strategy::Rle => CompressionStrategy::RLE,
            Strategy::Fixed => CompressionStrategy::Fixed,
        }
    }
}

/// Incremental zlib compressor.
pub struct DeflateCodec {
    state: Box<CompressorOxide>,
    /// Set once the engine was asked to finish. It must keep finishing from then on.
    finishing: bool,
}

impl DeflateCodec {
    /// Levels above 9 are clamped to 9.
    pub fn new(level: u8, strategy: Strategy) -> Self {
        let level = level.min(MAX_LEVEL);
        let flags = create_comp_flags_from_zip_params(
            i32::from(level),
            WINDOW_BITS,
            CompressionStrategy::from(strategy) as i32,
        );
        debug!("Deflate level {}, strategy {}", level, strategy);

        Self {
            state: Box::new(CompressorOxide::new(flags)),
            finishing: false,
        }
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL, Strategy::Default)
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &'static str {
        "deflate"
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step, StreamError> {
        if output.is_empty() {
            return Ok(Step::NeedsMoreOutput);
        }

        if !self.finishing && (input.is_empty() || output.len() >= max_output_size(input.len())) {
            trace!(
                "Finishing with {} bytes of input left and {} bytes of room",
                input.len(),
                output.len()
            );
            self.finishing = true;
        }
        let flush = if self.finishing {
            MZFlush::Finish
        } else {
            MZFlush::None
        };

        let result = deflate(&mut self.state, input, output, flush);
        let consumed = result.bytes_consumed;
        let produced = result.bytes_written;

        match result.status {
            Ok(MZStatus::StreamEnd) => Ok(Step::Finished { consumed, produced }),
            Ok(MZStatus::Ok) => Ok(Step::Progress { consumed, produced }),
            Ok(MZStatus::NeedDict) => Err(StreamError::need_dict()),
            // Ran out of room part way through; what was done still counts.
            Err(MZError::Buf) if consumed > 0 || produced > 0 => {
                Ok(Step::Progress { consumed, produced })
            }
            Err(e) => Err(e.into()),
        }
    }
}
