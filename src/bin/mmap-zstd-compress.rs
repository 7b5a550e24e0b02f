//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
use std::process::ExitCode;

use clap::Parser;
use log::info;

use mmap_deflate::compress_zstd;
use mmap_deflate::tools::cli::{init_logging, version_line, ZstdArgs};
use mmap_deflate::tools::report::Reporter;

fn main() -> ExitCode {
    let reporter = Reporter::from_args("mmap-zstd-compress");

    let args = match ZstdArgs::try_parse() {
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

    let opts = match args.into_opts() {
        Ok(opts) => opts,
        Err(e) => return reporter.fail(e),
    };

    match compress_zstd(&opts) {
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
