pub mod replay;
pub mod trace;

use collections::ConfigError;
use thiserror::Error;

pub use trace::ParseError;

#[derive(Debug, Error)]
pub enum ReplayError {
    /// Derived IO error
    #[error("Io error: {0}")]
    IoError(#[from] std::io::Error),

    /// A line of the trace could not be understood
    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },

    /// The table could not be built from the given options
    #[error("Invalid table configuration: {0}")]
    Config(#[from] ConfigError),

    /// The table disagreed with the reference map while replaying
    #[error("Line {line}: {reason}")]
    Mismatch { line: usize, reason: String },
}
