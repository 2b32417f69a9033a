use thiserror::Error;

/// Stable error codes the container layer can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidState,
    InvalidKey,
    FileCorrupt,
    NotImplemented,
    Config,
    Io,
}

/// All errors that can occur in the crypto and XML codec layers.
#[derive(Debug, Error)]
pub enum KdbxError {
    // --- Crypto errors ---
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Decryption failed: wrong key or corrupted ciphertext.
    #[error("Invalid key")]
    InvalidKey,

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    // --- Format errors ---
    #[error("File corrupt: {message}{}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    FileCorrupt {
        message: String,
        line: Option<usize>,
    },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KdbxError {
    /// A `FileCorrupt` error with no source position.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::FileCorrupt {
            message: message.into(),
            line: None,
        }
    }

    /// A `FileCorrupt` error tied to a line of the XML source.
    pub fn corrupt_at(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::FileCorrupt {
            message: message.into(),
            line,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::InvalidKey => ErrorCode::InvalidKey,
            Self::NotImplemented(_) => ErrorCode::NotImplemented,
            Self::FileCorrupt { .. } => ErrorCode::FileCorrupt,
            Self::Config(_) => ErrorCode::Config,
            Self::Io(_) => ErrorCode::Io,
        }
    }
}

/// Convenience type alias for kdbxcore results.
pub type Result<T> = std::result::Result<T, KdbxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_corrupt_message_includes_line_when_known() {
        let err = KdbxError::corrupt_at("bad protected value", Some(12));
        assert_eq!(err.to_string(), "File corrupt: bad protected value (line 12)");
        assert_eq!(err.code(), ErrorCode::FileCorrupt);

        let err = KdbxError::corrupt("bad xml");
        assert_eq!(err.to_string(), "File corrupt: bad xml");
    }

    #[test]
    fn invalid_key_does_not_leak_detail() {
        assert_eq!(KdbxError::InvalidKey.to_string(), "Invalid key");
        assert_eq!(KdbxError::InvalidKey.code(), ErrorCode::InvalidKey);
    }
}
