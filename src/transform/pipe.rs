//! Driving a [`PipeCodec`] between the same buffers the step driver uses.
//!
//! The codec gets a reader over the input and a writer over the output. The writer grows the output
//! the same way the step driver does. A failed grow can only reach the codec as an `io::Error`, so
//! the writer keeps the real error aside and the driver reports that one instead of whatever the
//! codec made of it.
//!
use std::io::{self, Read, Write};

use log::{debug, info};

use super::{next_capacity, Completed, TransformError};
use crate::codec::PipeCodec;
use crate::mapping::{InputBuffer, OutputBuffer};

/// Run `codec` over all of `input`, writing into `output` and growing it as needed.
pub fn pipe<I, B, C>(input: &I, output: &mut B, codec: &mut C) -> Result<Completed, TransformError>
where
    I: InputBuffer + ?Sized,
    B: OutputBuffer + ?Sized,
    C: PipeCodec + ?Sized,
{
    info!(
        "Starting {} of {} bytes into {} bytes of room",
        codec.name(),
        input.bytes().len(),
        output.capacity()
    );

    let mut reader = InputReader { input, pos: 0 };
    let mut writer = OutputWriter {
        output,
        pos: 0,
        grows: 0,
        failure: None,
    };
    let piped = codec.pipe(&mut reader, &mut writer);

    if let Some(failure) = writer.failure.take() {
        return Err(failure);
    }
    piped.map_err(|source| TransformError::Stream {
        codec: codec.name(),
        source,
    })?;

    info!(
        "Finished {}: {} bytes in, {} bytes out, {} grows",
        codec.name(),
        reader.pos,
        writer.pos,
        writer.grows
    );
    Ok(Completed {
        bytes_in: reader.pos,
        bytes_out: writer.pos,
        grows: writer.grows,
    })
}

struct InputReader<'a, I: ?Sized> {
    input: &'a I,
    pos: usize,
}

impl<I: InputBuffer + ?Sized> Read for InputReader<'_, I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = self.input.bytes().get(self.pos..).unwrap_or_default();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        self.input.release_before(self.pos);
        Ok(n)
    }
}

struct OutputWriter<'a, B: ?Sized> {
    output: &'a mut B,
    pos: usize,
    grows: usize,
    /// The grow failure behind the last write error, if there was one.
    failure: Option<TransformError>,
}

impl<B: OutputBuffer + ?Sized> OutputWriter<'_, B> {
    /// Grow until `end` fits.
    fn reserve(&mut self, end: usize) -> Result<(), TransformError> {
        while self.output.capacity() < end {
            let capacity = self.output.capacity();
            let new_capacity = next_capacity(capacity)?;
            debug!("Growing output from {} to {} bytes", capacity, new_capacity);
            self.output.grow(new_capacity)?;
            self.grows += 1;
        }
        Ok(())
    }
}

impl<B: OutputBuffer + ?Sized> Write for OutputWriter<'_, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let end = self
            .pos
            .checked_add(buf.len())
            .ok_or(TransformError::CapacityOverflow {
                capacity: self.output.capacity(),
            })
            .and_then(|end| self.reserve(end).map(|()| end));
        let end = match end {
            Ok(end) => end,
            Err(e) => {
                let err = io::Error::new(io::ErrorKind::Other, e.to_string());
                self.failure = Some(e);
                return Err(err);
            }
        };

        self.output.window()[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        self.output.release_before(self.pos);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
