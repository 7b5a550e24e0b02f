use std::fs;
use std::path::Path;

use log::{debug, error, info};

use crate::error::{Error, Result};
use crate::mapping::{InputRegion, MapError, OutputRegion};
use crate::transform::{Completed, TransformError};

/// Map `input_path`, create `output_path` at the size `initial_capacity` picks for the input, and
/// let `drive` run a codec from one to the other.
///
/// Both regions are always released. If anything fails after the output file was created, the
/// partial output is removed.
pub(crate) fn run<F, D>(
    input_path: &Path,
    output_path: &Path,
    initial_capacity: F,
    drive: D,
) -> Result<Completed>
where
    F: FnOnce(usize) -> usize,
    D: FnOnce(&InputRegion, &mut OutputRegion) -> std::result::Result<Completed, TransformError>,
{
    let mut input = InputRegion::open(input_path)?;

    // Creating the output truncates it, so this has to be caught first.
    if input.is_same_file(output_path) {
        input.release();
        return Err(Error::SameFile {
            input: input_path.to_path_buf(),
            output: output_path.to_path_buf(),
        });
    }

    let capacity = initial_capacity(input.len());
    let mut output = match OutputRegion::create(output_path, capacity) {
        Ok(output) => output,
        Err(e) => {
            input.release();
            return Err(e.into());
        }
    };

    let result = drive(&input, &mut output)
        .map_err(Error::from)
        .and_then(|done| {
            output.shrink_to(done.bytes_out)?;
            Ok(done)
        });
    let result = settle(result, output.release().map_err(Error::from));
    input.release();

    match &result {
        Ok(done) => info!(
            "Wrote {} bytes to {} ({} bytes read)",
            done.bytes_out,
            output_path.display(),
            done.bytes_in
        ),
        Err(_) => remove_partial(output_path),
    }
    result
}

/// Combine the outcome of a step with the outcome of the cleanup that follows it.
///
/// The first error wins. A cleanup error that would otherwise be lost is logged.
pub(crate) fn settle<T>(result: Result<T>, cleanup: Result<()>) -> Result<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(lost)) => {
            error!("{}", lost);
            Err(e)
        }
    }
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(source) => error!(
            "{}",
            MapError::Remove {
                path: path.to_path_buf(),
                source,
            }
        ),
    }
}
