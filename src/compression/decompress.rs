use std::path::PathBuf;

use log::info;

use crate::codec::InflateCodec;
use crate::error::Result;
use crate::transform::{transform, Completed};

use super::session;

/// Everything needed to decompress one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InflateOpts {
    /// zlib stream to read
    pub input: PathBuf,
    /// File to create, or truncate if it exists
    pub output: PathBuf,
}

impl InflateOpts {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Decompress the zlib stream in `opts.input` into `opts.output`.
///
/// There is no telling how big the result is, so the output starts at the size of the input and
/// grows from there. An empty input gives an empty output.
pub fn decompress(opts: &InflateOpts) -> Result<Completed> {
    info!(
        "Decompressing {} to {}",
        opts.input.display(),
        opts.output.display()
    );

    let mut codec = InflateCodec::new();
    session::run(&opts.input, &opts.output, |input_len| input_len, |input, output| {
        transform(input, output, &mut codec)
    })
}
