//! Decompression adapter: wraps miniz_oxide's inflate stream and reads a zlib stream.
//!
//! DEFLATE can't expand data by more than about 1032:1, so once the room left divided by 1032 is
//! more than the input left, the engine is told this is the last call it needs. That only lets it
//! take a faster path. The output is the same either way.
//!
use log::trace;
use miniz_oxide::inflate::stream::{inflate, InflateState};
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};

use super::{Codec, Step, StreamError};

/// Largest expansion a single DEFLATE block can realistically achieve.
const MAX_INFLATE_RATIO: usize = 1032;

/// Incremental zlib decompressor.
pub struct InflateCodec {
    state: Box<InflateState>,
    /// The engine has been called at least once.
    started: bool,
    /// Set once the engine was asked to finish. It refuses anything else after that.
    finishing: bool,
}

impl InflateCodec {
    pub fn new() -> Self {
        Self {
            state: InflateState::new_boxed(DataFormat::Zlib),
            started: false,
            finishing: false,
        }
    }
}

impl Default for InflateCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for InflateCodec {
    fn name(&self) -> &'static str {
        "inflate"
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step, StreamError> {
        // An empty file inflates to an empty file. There is nothing to hand the engine.
        if input.is_empty() && !self.started {
            return Ok(Step::Finished {
                consumed: 0,
                produced: 0,
            });
        }
        if output.is_empty() {
            return Ok(Step::NeedsMoreOutput);
        }

        // Out of input before the end marker: finishing makes the engine flush what it holds and
        // then admit the stream is cut short.
        if !self.finishing && (input.is_empty() || output.len() / MAX_INFLATE_RATIO > input.len()) {
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

        self.started = true;
        let result = inflate(&mut self.state, input, output, flush);
        let consumed = result.bytes_consumed;
        let produced = result.bytes_written;

        match result.status {
            Ok(MZStatus::StreamEnd) => Ok(Step::Finished { consumed, produced }),
            Ok(MZStatus::Ok) => Ok(Step::Progress { consumed, produced }),
            Ok(MZStatus::NeedDict) => Err(StreamError::need_dict()),
            // Output filled up while finishing; keep going after a grow.
            Err(MZError::Buf) if consumed > 0 || produced > 0 => {
                Ok(Step::Progress { consumed, produced })
            }
            // Room to write and nothing written: the engine wants input that isn't there.
            Err(MZError::Buf) => Err(StreamError::Truncated),
            Err(e) => Err(e.into()),
        }
    }
}
