//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
use std::process::ExitCode;

use clap::Parser;
use log::info;

use mmap_deflate::compress_lz4;
use mmap_deflate::tools::cli::{init_logging, version_line, Lz4Args};
use mmap_deflate::tools::report::Reporter;

fn main() -> ExitCode {
    let reporter = Reporter::from_args("mmap-lz4-compress");

    let args = match Lz4Args::try_parse() {
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

    match compress_lz4(&opts) {
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
