use std::fmt;
use std::process;

/// Exit codes for the CLI.
pub const EXIT_ERROR: i32 = 1;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Bad file path or unreadable input.
    Input(String),
    /// Error from the SBDF codec.
    Sbdf(sbdf_core::SbdfError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Input(msg) => write!(f, "error: {msg}"),
            CliError::Sbdf(e) => write!(f, "error: {e}"),
        }
    }
}

impl From<sbdf_core::SbdfError> for CliError {
    fn from(e: sbdf_core::SbdfError) -> Self {
        CliError::Sbdf(e)
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// Prints the error to stderr and exits nonzero.
pub fn exit_with_error(e: CliError) -> ! {
    eprintln!("{e}");
    process::exit(EXIT_ERROR);
}
