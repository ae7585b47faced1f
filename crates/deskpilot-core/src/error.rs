use thiserror::Error;

/// Top-level error type for Deskpilot.
///
/// Subsystem crates define their own error types; this one covers config
/// loading and platform detection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeskpilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

impl From<toml::de::Error> for DeskpilotError {
    fn from(err: toml::de::Error) -> Self {
        DeskpilotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DeskpilotError {
    fn from(err: toml::ser::Error) -> Self {
        DeskpilotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DeskpilotError {
    fn from(err: serde_json::Error) -> Self {
        DeskpilotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Deskpilot operations.
pub type Result<T> = std::result::Result<T, DeskpilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeskpilotError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = DeskpilotError::UnsupportedPlatform("plan9".to_string());
        assert_eq!(err.to_string(), "Platform not supported: plan9");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DeskpilotError = io_err.into();
        assert!(matches!(err, DeskpilotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: DeskpilotError = toml_err.into();
        assert!(matches!(err, DeskpilotError::Config(_)));
    }

    #[test]
    fn test_toml_ser_error_conversion() {
        // TOML cannot represent a bare value at the document root.
        let ser_err = toml::to_string(&1u8).unwrap_err();
        let err: DeskpilotError = ser_err.into();
        assert!(matches!(err, DeskpilotError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err: DeskpilotError = json_err.into();
        assert!(matches!(err, DeskpilotError::Serialization(_)));
    }
}
