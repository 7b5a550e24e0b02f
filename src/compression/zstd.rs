use std::path::{Path, PathBuf};

use log::info;

use crate::codec::zstd::{self, ZstdStrategy, DEFAULT_LEVEL};
use crate::codec::{ZstdDecoder, ZstdEncoder};
use crate::error::Result;
use crate::transform::{transform, Completed, TransformError};

use super::session;

/// Everything needed to compress one file with Zstandard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZstdOpts {
    /// File to read
    pub input: PathBuf,
    /// File to create, or truncate if it exists
    pub output: PathBuf,
    /// Negative levels are faster, up to 22 is smaller. Clamped to what zstd accepts.
    pub level: i32,
    /// Overrides the strategy the level would pick
    pub strategy: Option<ZstdStrategy>,
}

impl ZstdOpts {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            level: DEFAULT_LEVEL,
            strategy: None,
        }
    }
}

/// Compress `opts.input` into a single zstd frame in `opts.output`.
pub fn compress_zstd(opts: &ZstdOpts) -> Result<Completed> {
    info!(
        "Compressing {} to {} with zstd (level {})",
        opts.input.display(),
        opts.output.display(),
        opts.level
    );

    session::run(&opts.input, &opts.output, zstd::max_output_size, |input, output| {
        let mut codec = ZstdEncoder::new(opts.level, opts.strategy).map_err(|source| {
            TransformError::Stream {
                codec: "zstd-compress",
                source,
            }
        })?;
        transform(input, output, &mut codec)
    })
}

/// Decompress the zstd frames in `input` into `output`. The output starts at the size of the input.
pub fn decompress_zstd<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<Completed> {
    let (input, output) = (input.as_ref(), output.as_ref());
    info!(
        "Decompressing {} to {} with zstd",
        input.display(),
        output.display()
    );

    session::run(input, output, |input_len| input_len, |input, output| {
        let mut codec = ZstdDecoder::new().map_err(|source| TransformError::Stream {
            codec: "zstd-decompress",
            source,
        })?;
        transform(input, output, &mut codec)
    })
}
