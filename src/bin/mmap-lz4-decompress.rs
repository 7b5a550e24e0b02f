//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
use std::process::ExitCode;

use log::info;

use mmap_deflate::decompress_lz4;
use mmap_deflate::tools::cli::{init_logging, version_line, DecompressArgs};
use mmap_deflate::tools::report::Reporter;

fn main() -> ExitCode {
    let reporter = Reporter::from_args("mmap-lz4-decompress");

    let args = match DecompressArgs::try_parse_as("mmap-lz4-decompress") {
        Ok(args) => args,
        Err(e) => return reporter.clap_error(e),
    };
    if let Err(e) = init_logging(args.verbosity()) {
        reporter.warn(e);
    }

    if args.show_version {
        println!("{}", version_line(reporter.executable()));
        return ExitCode::SUCCESS;
    }

    let (input, output) = match args.into_paths() {
        Ok(paths) => paths,
        Err(e) => return reporter.fail(e),
    };

    match decompress_lz4(&input, &output) {
        Ok(done) => {
            info!(
                "Done. {} bytes in, {} bytes out.",
                done.bytes_in, done.bytes_out
            );
            ExitCode::SUCCESS
        }
        Err(e) => reporter.fail(e),
    }
}
