//! Command line parsing for the mmap compressors and decompressors, plus logger setup.
use std::ffi::OsString;
use std::path::PathBuf;
use std::{fmt::Display, fmt::Formatter};

use clap::{CommandFactory, FromArgMatches, Parser};
use log::{info, LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use thiserror::Error;

use crate::codec::deflate::{DEFAULT_LEVEL, MAX_LEVEL};
use crate::codec::lz4::{Lz4BlockMode, Lz4BlockSize};
use crate::codec::zstd::{self, ZstdStrategy};
use crate::codec::Strategy;
use crate::compression::{DeflateOpts, InflateOpts, Lz4Opts, ZstdOpts};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Warnings,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// Map the number of times `--verbose` was given to a level.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Warnings,
            1 => Verbosity::Info,
            2 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Warnings => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Problems with the command line that clap itself doesn't catch.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("missing argument {0}")]
    Missing(&'static str),
}

/// Compress a file into a zlib stream through memory-mapped I/O.
#[derive(Parser, Debug)]
#[clap(name = "mmap-deflate")]
pub struct DeflateArgs {
    /// File to compress
    #[clap(value_name = "INPUT_FILE", value_parser)]
    input: Option<PathBuf>,

    /// Where to write the zlib stream. Truncated if it exists
    #[clap(value_name = "OUTPUT_FILE", value_parser)]
    output: Option<PathBuf>,

    /// Compression level, 0 (store only) to 9 (smallest output)
    #[clap(short = 'l', long, value_name = "N", default_value_t = DEFAULT_LEVEL, value_parser = parse_level)]
    level: u8,

    /// Compression strategy
    #[clap(short = 's', long, value_name = "NAME", value_enum, default_value_t = Strategy::Default)]
    strategy: Strategy,

    /// Print version information and exit
    #[clap(short = 'v', long = "version")]
    pub show_version: bool,

    /// Log progress to stderr. Repeat for more detail
    #[clap(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl DeflateArgs {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_count(self.verbose)
    }

    /// Turn the parsed arguments into compression options. Both files are required here.
    pub fn into_opts(self) -> Result<DeflateOpts, CliError> {
        let (input, output) = required_paths(self.input, self.output)?;
        let opts = DeflateOpts {
            input,
            output,
            level: self.level,
            strategy: self.strategy,
        };
        info!("Level set to {}, strategy set to {}", opts.level, opts.strategy);
        Ok(opts)
    }
}

/// Decompress a file through memory-mapped I/O.
///
/// The same arguments serve every decompressor. `mmap-inflate` is the default name.
#[derive(Parser, Debug)]
#[clap(name = "mmap-inflate")]
pub struct DecompressArgs {
    /// Compressed file to read
    #[clap(value_name = "INPUT_FILE", value_parser)]
    input: Option<PathBuf>,

    /// Where to write the decompressed data. Truncated if it exists
    #[clap(value_name = "OUTPUT_FILE", value_parser)]
    output: Option<PathBuf>,

    /// Print version information and exit
    #[clap(short = 'v', long = "version")]
    pub show_version: bool,

    /// Log progress to stderr. Repeat for more detail
    #[clap(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl DecompressArgs {
    /// Parse the process arguments for the decompressor called `name`.
    pub fn try_parse_as(name: &'static str) -> Result<Self, clap::Error> {
        Self::try_parse_from_as(name, std::env::args_os())
    }

    pub fn try_parse_from_as<I, T>(name: &'static str, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().name(name).try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_count(self.verbose)
    }

    /// The input and output paths. Both are required here.
    pub fn into_paths(self) -> Result<(PathBuf, PathBuf), CliError> {
        required_paths(self.input, self.output)
    }

    pub fn into_opts(self) -> Result<InflateOpts, CliError> {
        let (input, output) = self.into_paths()?;
        Ok(InflateOpts { input, output })
    }
}

/// Compress a file into a Zstandard frame through memory-mapped I/O.
#[derive(Parser, Debug)]
#[clap(name = "mmap-zstd-compress")]
pub struct ZstdArgs {
    /// File to compress
    #[clap(value_name = "INPUT_FILE", value_parser)]
    input: Option<PathBuf>,

    /// Where to write the zstd frame. Truncated if it exists
    #[clap(value_name = "OUTPUT_FILE", value_parser)]
    output: Option<PathBuf>,

    /// Compression level. Negative levels are faster, higher levels give smaller output
    #[clap(
        short = 'l',
        long,
        value_name = "N",
        default_value_t = zstd::DEFAULT_LEVEL,
        value_parser = parse_zstd_level,
        allow_hyphen_values = true
    )]
    level: i32,

    /// Match finding strategy, from fastest to strongest. The level picks one if not given
    #[clap(short = 's', long, value_name = "NAME", value_enum)]
    strategy: Option<ZstdStrategy>,

    /// Print version information and exit
    #[clap(short = 'v', long = "version")]
    pub show_version: bool,

    /// Log progress to stderr. Repeat for more detail
    #[clap(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ZstdArgs {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_count(self.verbose)
    }

    pub fn into_opts(self) -> Result<ZstdOpts, CliError> {
        let (input, output) = required_paths(self.input, self.output)?;
        let opts = ZstdOpts {
            input,
            output,
            level: self.level,
            strategy: self.strategy,
        };
        match opts.strategy {
            Some(strategy) => info!("Level set to {}, strategy set to {}", opts.level, strategy),
            None => info!("Level set to {}", opts.level),
        }
        Ok(opts)
    }
}

/// Compress a file into an LZ4 frame through memory-mapped I/O.
#[derive(Parser, Debug)]
#[clap(name = "mmap-lz4-compress")]
pub struct Lz4Args {
    /// File to compress
    #[clap(value_name = "INPUT_FILE", value_parser)]
    input: Option<PathBuf>,

    /// Where to write the LZ4 frame. Truncated if it exists
    #[clap(value_name = "OUTPUT_FILE", value_parser)]
    output: Option<PathBuf>,

    /// Largest block. Bigger blocks compress better but need more memory on both ends
    #[clap(short = 's', long, value_name = "SIZE", value_enum, default_value_t = Lz4BlockSize::Default)]
    block_size: Lz4BlockSize,

    /// Linked blocks compress small blocks better. Some decoders only read independent blocks
    #[clap(short = 'm', long, value_name = "MODE", value_enum, default_value_t = Lz4BlockMode::Linked)]
    block_mode: Lz4BlockMode,

    /// Print version information and exit
    #[clap(short = 'v', long = "version")]
    pub show_version: bool,

    /// Log progress to stderr. Repeat for more detail
    #[clap(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Lz4Args {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_count(self.verbose)
    }

    pub fn into_opts(self) -> Result<Lz4Opts, CliError> {
        let (input, output) = required_paths(self.input, self.output)?;
        let opts = Lz4Opts {
            input,
            output,
            block_size: self.block_size,
            block_mode: self.block_mode,
        };
        info!(
            "Block size set to {}, block mode set to {}",
            opts.block_size, opts.block_mode
        );
        Ok(opts)
    }
}

fn required_paths(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(PathBuf, PathBuf), CliError> {
    let input = input.ok_or(CliError::Missing("INPUT_FILE"))?;
    let output = output.ok_or(CliError::Missing("OUTPUT_FILE"))?;
    Ok((input, output))
}

/// Level parser. Accepts 0 to 9, nothing else.
fn parse_level(s: &str) -> Result<u8, String> {
    let level: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("couldn't parse '{}' as a compression level", s))?;
    if !(0..=i64::from(MAX_LEVEL)).contains(&level) {
        return Err(format!(
            "expected LEVEL to be in the range [0, {}], got {}",
            MAX_LEVEL, level
        ));
    }
    Ok(level as u8)
}

/// zstd level parser. Accepts whatever the linked zstd accepts.
fn parse_zstd_level(s: &str) -> Result<i32, String> {
    let (min, max) = zstd::level_range();
    let level: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("couldn't parse '{}' as a compression level", s))?;
    if !(i64::from(min)..=i64::from(max)).contains(&level) {
        return Err(format!(
            "expected LEVEL to be in the range [{}, {}], got {}",
            min, max, level
        ));
    }
    Ok(level as i32)
}

/// Send log output to stderr at the requested verbosity. Stdout is left for help and version text.
pub fn init_logging(verbosity: Verbosity) -> Result<(), SetLoggerError> {
    TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    log::set_max_level(verbosity.level_filter());
    info!("Verbosity set to {}", verbosity);
    Ok(())
}

/// The line printed for `--version`.
pub fn version_line(executable: &str) -> String {
    format!("{} {}", executable, VERSION)
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn deflate_defaults_test() {
        let args = DeflateArgs::try_parse_from(["mmap-deflate", "in", "out"]).unwrap();
        assert_eq!(args.verbosity(), Verbosity::Warnings);
        assert!(!args.show_version);
        let opts = args.into_opts().unwrap();
        assert_eq!(opts, DeflateOpts::new("in", "out"));
    }

    #[test]
    fn deflate_options_test() {
        let args = DeflateArgs::try_parse_from([
            "mmap-deflate",
            "--level=9",
            "-s",
            "huffman-only",
            "--verbose",
            "--verbose",
            "in",
            "out",
        ])
        .unwrap();
        assert_eq!(args.verbosity(), Verbosity::Debug);
        let opts = args.into_opts().unwrap();
        assert_eq!(opts.level, 9);
        assert_eq!(opts.strategy, Strategy::HuffmanOnly);

        let args =
            DeflateArgs::try_parse_from(["mmap-deflate", "-l", "0", "--strategy=rle", "a", "b"])
                .unwrap();
        let opts = args.into_opts().unwrap();
        assert_eq!(opts.level, 0);
        assert_eq!(opts.strategy, Strategy::Rle);
    }

    #[test]
    fn bad_level_test() {
        let err =
            DeflateArgs::try_parse_from(["mmap-deflate", "--level=10", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("expected LEVEL to be in the range [0, 9], got 10"));

        let err =
            DeflateArgs::try_parse_from(["mmap-deflate", "--level=abc", "a", "b"]).unwrap_err();
        assert!(err.to_string().contains("couldn't parse 'abc' as a compression level"));

        assert!(DeflateArgs::try_parse_from(["mmap-deflate", "--level=-1", "a", "b"]).is_err());
    }

    #[test]
    fn bad_strategy_test() {
        let err = DeflateArgs::try_parse_from(["mmap-deflate", "--strategy=bogus", "a", "b"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn unknown_option_test() {
        let err = DecompressArgs::try_parse_from(["mmap-inflate", "--fast", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn missing_paths_test() {
        let args = DecompressArgs::try_parse_from(["mmap-inflate"]).unwrap();
        assert_eq!(args.into_opts().unwrap_err(), CliError::Missing("INPUT_FILE"));

        let args = DecompressArgs::try_parse_from(["mmap-inflate", "a"]).unwrap();
        let err = args.into_opts().unwrap_err();
        assert_eq!(err.to_string(), "missing argument OUTPUT_FILE");
    }

    #[test]
    fn version_and_help_test() {
        let args = DecompressArgs::try_parse_from(["mmap-inflate", "-v"]).unwrap();
        assert!(args.show_version);
        let args = DeflateArgs::try_parse_from(["mmap-deflate", "--version"]).unwrap();
        assert!(args.show_version);

        let err = DeflateArgs::try_parse_from(["mmap-deflate", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        assert_eq!(version_line("mmap-inflate"), format!("mmap-inflate {}", VERSION));
    }

    #[test]
    fn verbosity_test() {
        assert_eq!(Verbosity::from_count(0).level_filter(), LevelFilter::Warn);
        assert_eq!(Verbosity::from_count(1).level_filter(), LevelFilter::Info);
        assert_eq!(Verbosity::from_count(2).level_filter(), LevelFilter::Debug);
        assert_eq!(Verbosity::from_count(7).level_filter(), LevelFilter::Trace);
        assert_eq!(Verbosity::from_count(u8::MAX), Verbosity::Trace);
    }

    #[test]
    fn repeated_verbose_test() {
        let verbose = ["--verbose", "--verbose", "--verbose"];

        let args = DeflateArgs::try_parse_from(
            ["mmap-deflate"].into_iter().chain(verbose).chain(["a", "b"]),
        )
        .unwrap();
        assert_eq!(args.verbose, 3);
        assert_eq!(args.verbosity(), Verbosity::Trace);

        let args =
            DecompressArgs::try_parse_from(["mmap-inflate"].into_iter().chain(verbose)).unwrap();
        assert_eq!(args.verbosity(), Verbosity::Trace);

        let args =
            ZstdArgs::try_parse_from(["mmap-zstd-compress"].into_iter().chain(verbose)).unwrap();
        assert_eq!(args.verbosity(), Verbosity::Trace);

        let args =
            Lz4Args::try_parse_from(["mmap-lz4-compress"].into_iter().chain(verbose)).unwrap();
        assert_eq!(args.verbosity(), Verbosity::Trace);
    }

    #[test]
    fn decompress_name_test() {
        let err = DecompressArgs::try_parse_from_as(
            "mmap-zstd-decompress",
            ["mmap-zstd-decompress", "--help"],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("mmap-zstd-decompress"));

        let args = DecompressArgs::try_parse_from_as("mmap-lz4-decompress", ["x", "in.lz4", "out"])
            .unwrap();
        assert_eq!(
            args.into_paths().unwrap(),
            (PathBuf::from("in.lz4"), PathBuf::from("out"))
        );
    }

    #[test]
    fn zstd_options_test() {
        let args = ZstdArgs::try_parse_from(["mmap-zstd-compress", "a", "b"]).unwrap();
        let opts = args.into_opts().unwrap();
        assert_eq!(opts, ZstdOpts::new("a", "b"));

        let args =
            ZstdArgs::try_parse_from(["mmap-zstd-compress", "-l", "-5", "-s", "btultra2", "a", "b"])
                .unwrap();
        let opts = args.into_opts().unwrap();
        assert_eq!(opts.level, -5);
        assert_eq!(opts.strategy, Some(ZstdStrategy::Btultra2));

        let err = ZstdArgs::try_parse_from(["mmap-zstd-compress", "--level=23", "a", "b"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("expected LEVEL to be in the range"));

        let err = ZstdArgs::try_parse_from(["mmap-zstd-compress", "--strategy=lazy3", "a", "b"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn lz4_options_test() {
        let args = Lz4Args::try_parse_from(["mmap-lz4-compress", "a", "b"]).unwrap();
        assert_eq!(args.into_opts().unwrap(), Lz4Opts::new("a", "b"));

        let args = Lz4Args::try_parse_from([
            "mmap-lz4-compress",
            "--block-size=256KB",
            "-m",
            "independent",
            "a",
            "b",
        ])
        .unwrap();
        let opts = args.into_opts().unwrap();
        assert_eq!(opts.block_size, Lz4BlockSize::Max256Kb);
        assert_eq!(opts.block_mode, Lz4BlockMode::Independent);

        let err =
            Lz4Args::try_parse_from(["mmap-lz4-compress", "-s", "2MB", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
