use std::path::PathBuf;

use log::info;

use crate::codec::deflate::DEFAULT_LEVEL;
use crate::codec::{max_output_size, DeflateCodec, Strategy};
use crate::error::Result;
use crate::transform::{transform, Completed};

use super::session;

/// Everything needed to compress one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeflateOpts {
    /// File to read
    pub input: PathBuf,
    /// File to create, or truncate if it exists
    pub output: PathBuf,
    /// 0 (store only) to 9 (smallest output)
    pub level: u8,
    pub strategy: Strategy,
}

impl DeflateOpts {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            level: DEFAULT_LEVEL,
            strategy: Strategy::Default,
        }
    }
}

/// Compress `opts.input` into a zlib stream in `opts.output`.
///
/// The output starts out at the worst case size for the input, so it normally never has to grow.
pub fn compress(opts: &DeflateOpts) -> Result<Completed> {
    info!(
        "Compressing {} to {} (level {}, strategy {})",
        opts.input.display(),
        opts.output.display(),
        opts.level,
        opts.strategy
    );

    let mut codec = DeflateCodec::new(opts.level, opts.strategy);
    session::run(&opts.input, &opts.output, max_output_size, |input, output| {
        transform(input, output, &mut codec)
    })
}
