//! The transform module drives a codec from the first input byte to the end of the stream.
//!
//! The driver keeps two cursors, one into the input and one into the output. On every pass it hands
//! the codec everything after the input cursor and all the room after the output cursor, then moves
//! the cursors by whatever the codec reports. When the codec runs out of room, the output buffer is
//! grown (at least doubled) and the same step is tried again with the input cursor unchanged.
//!
//! Every pass either consumes input, produces output, grows the buffer, or fails, so the loop
//! always ends. After each pass both buffers are told how far the cursors got, so file backed ones
//! can give the pages behind them back.
//!
//! - pipe: the same job for codecs that read from a `Read` and write into a `Write`.
//!
pub mod pipe;

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::codec::{Codec, Step, StreamError};
use crate::mapping::{InputBuffer, MapError, OutputBuffer};

pub use pipe::pipe;

/// Smallest amount the output is ever grown to. Avoids a remap per byte for tiny outputs.
pub const MIN_GROWTH: usize = 64 * 1024;

/// What a finished transform did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completed {
    /// Input bytes the codec consumed. Less than the input length if there were trailing bytes.
    pub bytes_in: usize,
    /// Output bytes written. This is the length the output should be truncated to.
    pub bytes_out: usize,
    /// Number of times the output had to grow.
    pub grows: usize,
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("couldn't {codec} stream: {source}")]
    Stream {
        codec: &'static str,
        #[source]
        source: StreamError,
    },

    #[error(transparent)]
    Grow(#[from] MapError),

    #[error("codec made no progress at input offset {input_offset}, output offset {output_offset}")]
    Stalled {
        input_offset: usize,
        output_offset: usize,
    },

    #[error("output size overflowed while growing past {capacity} bytes")]
    CapacityOverflow { capacity: usize },
}

impl TransformError {
    /// The codec failure behind this error, if it was one.
    pub fn stream_error(&self) -> Option<&StreamError> {
        match self {
            TransformError::Stream { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Run `codec` over all of `input`, writing into `output` and growing it as needed.
///
/// On success the first `bytes_out` bytes of `output` hold the result. On failure the contents of
/// `output` are unspecified.
pub fn transform<I, B, C>(
    input: &I,
    output: &mut B,
    codec: &mut C,
) -> Result<Completed, TransformError>
where
    I: InputBuffer + ?Sized,
    B: OutputBuffer + ?Sized,
    C: Codec + ?Sized,
{
    let bytes = input.bytes();
    let mut in_pos = 0;
    let mut out_pos = 0;
    let mut grows = 0;

    info!(
        "Starting {} of {} bytes into {} bytes of room",
        codec.name(),
        bytes.len(),
        output.capacity()
    );

    loop {
        let step = {
            let window = output.window();
            let room = window.get_mut(out_pos..).unwrap_or_default();
            codec
                .step(&bytes[in_pos..], room)
                .map_err(|source| TransformError::Stream {
                    codec: codec.name(),
                    source,
                })?
        };

        match step {
            Step::Progress { consumed, produced } => {
                if consumed == 0 && produced == 0 {
                    return Err(TransformError::Stalled {
                        input_offset: in_pos,
                        output_offset: out_pos,
                    });
                }
                in_pos += consumed;
                out_pos += produced;
                input.release_before(in_pos);
                output.release_before(out_pos);
                trace!(
                    "{} step: consumed {}, produced {} (at {} / {})",
                    codec.name(),
                    consumed,
                    produced,
                    in_pos,
                    out_pos
                );
            }
            Step::Finished { consumed, produced } => {
                in_pos += consumed;
                out_pos += produced;
                input.release_before(in_pos);
                output.release_before(out_pos);

                let trailing = bytes.len() - in_pos;
                if trailing > 0 {
                    warn!(
                        "Ignoring {} trailing bytes after the end of the {} stream",
                        trailing,
                        codec.name()
                    );
                }
                info!(
                    "Finished {}: {} bytes in, {} bytes out, {} grows",
                    codec.name(),
                    in_pos,
                    out_pos,
                    grows
                );
                return Ok(Completed {
                    bytes_in: in_pos,
                    bytes_out: out_pos,
                    grows,
                });
            }
            Step::NeedsMoreOutput => {
                let capacity = output.capacity();
                let new_capacity = next_capacity(capacity)?;
                debug!("Growing output from {} to {} bytes", capacity, new_capacity);
                output.grow(new_capacity)?;
                grows += 1;
            }
        }
    }
}

/// Double the capacity, but never grow to less than `MIN_GROWTH`.
pub fn next_capacity(capacity: usize) -> Result<usize, TransformError> {
    capacity
        .checked_mul(2)
        .map(|doubled| doubled.max(MIN_GROWTH))
        .ok_or(TransformError::CapacityOverflow { capacity })
}
