//! Error types for the picker.

use thiserror::Error;

/// Result type alias for picker operations.
pub type Result<T> = std::result::Result<T, PickerError>;

/// Errors that can occur while running the picker.
#[derive(Error, Debug)]
pub enum PickerError {
    /// The controlling terminal could not be opened.
    #[error("cannot open the controlling terminal: {0}")]
    NoTerminal(#[source] std::io::Error),

    /// Terminal IO failed mid-session.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}
