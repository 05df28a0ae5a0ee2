//! Error types for Sarathi

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Sarathi error types
///
/// Failure to open a serial link at startup is fatal and reported through
/// this type. Broken protocol invariants (short fixed-size records, grid
/// writes outside the mapped extent) are programming errors and panic
/// instead of passing through here. Corrupt lidar frames are not errors at
/// all; the framer drops them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
