//! Error taxonomy for netlist loading, pattern/fault IO and test generation

use std::fmt;
use std::io;

/// Errors that can occur while loading, simulating or generating tests for a circuit
#[derive(Debug)]
pub enum EngineError {
    /// File open/read/write failure
    Io(io::Error),
    /// Malformed netlist, pattern or fault file
    Format(String),
    /// A command that requires a loaded circuit was issued with none loaded
    Order(String),
    /// PODEM or the D-algorithm exceeded its time budget for a fault
    Timeout,
    /// PODEM or the D-algorithm exhausted its search space for a fault
    Untestable,
    /// An internal invariant was violated (e.g. the graph could not be levelized)
    InternalInvariant(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Io(e) => write!(f, "IO error: {e}"),
            EngineError::Format(msg) => write!(f, "format error: {msg}"),
            EngineError::Order(msg) => write!(f, "command order error: {msg}"),
            EngineError::Timeout => write!(f, "test generation timed out"),
            EngineError::Untestable => write!(f, "fault is untestable"),
            EngineError::InternalInvariant(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::Io(e)
    }
}

/// Result alias used throughout the crate for fallible operations
pub type Result<T> = std::result::Result<T, EngineError>;
