//! User facing diagnostics. Every failure ends in exactly one line on stderr.
use std::ffi::OsString;
use std::fmt::Display;
use std::path::Path;
use std::process::ExitCode;

/// Knows the name the program was started under, and prefixes every diagnostic with it.
#[derive(Debug, Clone)]
pub struct Reporter {
    executable: String,
}

impl Reporter {
    pub fn new<S: Into<String>>(executable: S) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Take the name from `argv[0]`, falling back to `default` if there isn't one.
    pub fn from_args(default: &str) -> Self {
        Self::new(executable_name(std::env::args_os().next(), default))
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn error_line<M: Display>(&self, msg: M) -> String {
        format!("{}: error: {}", self.executable, msg)
    }

    pub fn warning_line<M: Display>(&self, msg: M) -> String {
        format!("{}: warning: {}", self.executable, msg)
    }

    /// Report a failure and hand back the exit code for it.
    pub fn fail<M: Display>(&self, msg: M) -> ExitCode {
        eprintln!("{}", self.error_line(msg));
        ExitCode::FAILURE
    }

    pub fn warn<M: Display>(&self, msg: M) {
        eprintln!("{}", self.warning_line(msg));
    }

    /// Deal with a command line clap refused. Help goes to stdout with a zero exit code, anything
    /// else is reported as a single error line.
    pub fn clap_error(&self, err: clap::Error) -> ExitCode {
        use clap::error::ErrorKind;

        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => match err.print() {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => self.fail(e),
            },
            _ => self.fail(clap_message(&err)),
        }
    }
}

/// First line of clap's rendering, without its own "error: " prefix.
fn clap_message(err: &clap::Error) -> String {
    let text = err.to_string();
    let first = text.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn executable_name(arg0: Option<OsString>, default: &str) -> String {
    arg0.as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| default.to_string())
}
