//! Worst case output size for compression.
//!
//! The output file is created at this size so that, for ordinary inputs, the whole stream fits in
//! the first mapping and the codec can be told to finish right away. The model charges the
//! overhead of a stored block for every block of input plus a fixed cost per stream. Guessing too
//! low is not fatal, it only costs a grow of the output file.

/// Bytes of input charged as one block.
const BLOCK_SIZE: usize = 16_000;
/// A stored block header (3 bits, padding, LEN and NLEN) fits in five bytes.
const BYTES_PER_BLOCK: usize = 5;
/// zlib header (2), Adler-32 trailer (4) and a closing block with padding (5).
const OVERHEAD_PER_STREAM: usize = 11;

/// Upper bound on the compressed size of `input_size` bytes.
pub fn max_output_size(input_size: usize) -> usize {
    let blocks = input_size.div_ceil(BLOCK_SIZE).max(1);

    input_size
        .saturating_add(blocks.saturating_mul(BYTES_PER_BLOCK))
        .saturating_add(OVERHEAD_PER_STREAM)
}
