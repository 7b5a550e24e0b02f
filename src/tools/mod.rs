//! The tools module holds the pieces the two binaries share.
//!
//! The tools are:
//! - cli: Command line parsing for mmap-deflate and mmap-inflate, and logger setup.
//! - report: Single line diagnostics prefixed with the executable name.
//!
pub mod cli;
pub mod report;
