//! LZ4 adapters: the LZ4 frame format through lz4_flex.
//!
//! lz4_flex reads frames from a `Read` and writes them into a `Write`, so these adapters are
//! [`PipeCodec`]s rather than step-wise codecs. The frames are the standard format, readable by the
//! `lz4` tool.
//!
use std::fmt::{Display, Formatter};
use std::io::{self, Read, Write};

use clap::ValueEnum;
use log::debug;
use lz4_flex::frame::{BlockMode, BlockSize, FrameDecoder, FrameEncoder, FrameInfo};

use super::{PipeCodec, StreamError};

/// Magic number, flags, block descriptor, content size and header checksum.
const MAX_HEADER_SIZE: usize = 19;
/// End mark and content checksum.
const MAX_TRAILER_SIZE: usize = 8;
/// Every block is prefixed with its length.
const BLOCK_HEADER_SIZE: usize = 4;

/// Largest uncompressed block the encoder may write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Lz4BlockSize {
    #[default]
    #[clap(name = "default")]
    Default,
    #[clap(name = "64KB")]
    Max64Kb,
    #[clap(name = "256KB")]
    Max256Kb,
    #[clap(name = "1MB")]
    Max1Mb,
    #[clap(name = "4MB")]
    Max4Mb,
}

impl Lz4BlockSize {
    pub fn bytes(self) -> usize {
        match self {
            Lz4BlockSize::Default | Lz4BlockSize::Max64Kb => 64 * 1024,
            Lz4BlockSize::Max256Kb => 256 * 1024,
            Lz4BlockSize::Max1Mb => 1024 * 1024,
            Lz4BlockSize::Max4Mb => 4 * 1024 * 1024,
        }
    }
}

impl Display for Lz4BlockSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lz4BlockSize::Default => "default",
            Lz4BlockSize::Max64Kb => "64KB",
            Lz4BlockSize::Max256Kb => "256KB",
            Lz4BlockSize::Max1Mb => "1MB",
            Lz4BlockSize::Max4Mb => "4MB",
        };
        write!(f, "{}", name)
    }
}

impl From<Lz4BlockSize> for BlockSize {
    fn from(size: Lz4BlockSize) -> Self {
        match size {
            Lz4BlockSize::Default | Lz4BlockSize::Max64Kb => BlockSize::Max64KB,
            Lz4BlockSize::Max256Kb => BlockSize::Max256KB,
            Lz4BlockSize::Max1Mb => BlockSize::Max1MB,
            Lz4BlockSize::Max4Mb => BlockSize::Max4MB,
        }
    }
}

/// Linked blocks may refer back into the previous block, which helps small blocks. Some decoders
/// only handle independent blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Lz4BlockMode {
    #[default]
    Linked,
    Independent,
}

impl Display for Lz4BlockMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Lz4BlockMode::Linked => write!(f, "linked"),
            Lz4BlockMode::Independent => write!(f, "independent"),
        }
    }
}

impl From<Lz4BlockMode> for BlockMode {
    fn from(mode: Lz4BlockMode) -> Self {
        match mode {
            Lz4BlockMode::Linked => BlockMode::Linked,
            Lz4BlockMode::Independent => BlockMode::Independent,
        }
    }
}

/// Upper bound on the size of an LZ4 frame holding `input_size` bytes.
///
/// A block that doesn't shrink is stored as is, so each block costs at most its length header.
pub fn max_output_size(input_size: usize, block_size: Lz4BlockSize) -> usize {
    let blocks = input_size.div_ceil(block_size.bytes()).max(1);

    input_size
        .saturating_add(blocks.saturating_mul(BLOCK_HEADER_SIZE))
        .saturating_add(MAX_HEADER_SIZE + MAX_TRAILER_SIZE)
}

/// Writes one LZ4 frame holding everything it reads.
#[derive(Debug, Clone)]
pub struct Lz4Encoder {
    frame: FrameInfo,
}

impl Lz4Encoder {
    pub fn new(block_size: Lz4BlockSize, block_mode: Lz4BlockMode) -> Self {
        debug!("LZ4 block size {}, block mode {}", block_size, block_mode);
        Self {
            frame: FrameInfo::new()
                .block_size(block_size.into())
                .block_mode(block_mode.into()),
        }
    }

    /// Record the uncompressed size in the frame header. The decoder checks it.
    pub fn content_size(mut self, size: u64) -> Self {
        self.frame = self.frame.content_size(Some(size));
        self
    }
}

impl Default for Lz4Encoder {
    fn default() -> Self {
        Self::new(Lz4BlockSize::Default, Lz4BlockMode::Linked)
    }
}

impl PipeCodec for Lz4Encoder {
    fn name(&self) -> &'static str {
        "lz4-compress"
    }

    fn pipe(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), StreamError> {
        let mut encoder = FrameEncoder::with_frame_info(self.frame.clone(), output);
        io::copy(input, &mut encoder).map_err(StreamError::engine)?;
        encoder
            .finish()
            .map_err(|e| StreamError::Engine(e.to_string()))?;
        Ok(())
    }
}

/// Reads LZ4 frames, one after the other, until the input runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Decoder;

impl PipeCodec for Lz4Decoder {
    fn name(&self) -> &'static str {
        "lz4-decompress"
    }

    fn pipe(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), StreamError> {
        let mut decoder = FrameDecoder::new(input);
        io::copy(&mut decoder, output).map_err(StreamError::decoding)?;
        Ok(())
    }
}
