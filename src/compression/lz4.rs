use std::path::{Path, PathBuf};

use log::info;

use crate::codec::lz4::{self, Lz4BlockMode, Lz4BlockSize};
use crate::codec::{Lz4Decoder, Lz4Encoder};
use crate::error::Result;
use crate::transform::{pipe, Completed};

use super::session;

/// Everything needed to compress one file into an LZ4 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lz4Opts {
    /// File to read
    pub input: PathBuf,
    /// File to create, or truncate if it exists
    pub output: PathBuf,
    pub block_size: Lz4BlockSize,
    pub block_mode: Lz4BlockMode,
}

impl Lz4Opts {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            block_size: Lz4BlockSize::Default,
            block_mode: Lz4BlockMode::Linked,
        }
    }
}

/// Compress `opts.input` into one LZ4 frame in `opts.output`. The frame records the input size.
pub fn compress_lz4(opts: &Lz4Opts) -> Result<Completed> {
    info!(
        "Compressing {} to {} with lz4 (block size {}, block mode {})",
        opts.input.display(),
        opts.output.display(),
        opts.block_size,
        opts.block_mode
    );

    let initial_capacity = |input_len| lz4::max_output_size(input_len, opts.block_size);
    session::run(&opts.input, &opts.output, initial_capacity, |input, output| {
        let mut codec =
            Lz4Encoder::new(opts.block_size, opts.block_mode).content_size(input.len() as u64);
        pipe(input, output, &mut codec)
    })
}

/// Decompress the LZ4 frames in `input` into `output`. The output starts at the size of the input.
pub fn decompress_lz4<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<Completed> {
    let (input, output) = (input.as_ref(), output.as_ref());
    info!(
        "Decompressing {} to {} with lz4",
        input.display(),
        output.display()
    );

    session::run(input, output, |input_len| input_len, |input, output| {
        pipe(input, output, &mut Lz4Decoder)
    })
}
