use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example, caused by malformed input - merely that
    /// it cannot be confidently determined by the code.
    Internal,

    /// The input was malformed, tampered with, or asked for something that
    /// does not exist.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An opening delimiter named a block type outside the supported set.
    UnsupportedBlockType,
    /// The closing delimiter named a different block type than the opening one.
    ClosingTypeMismatch,
    /// The accumulated base64 body could not be decoded.
    InvalidBase64Body,
    /// The checksum line could not be decoded.
    InvalidChecksumEncoding,
    /// The embedded checksum differs from the CRC-24 of the decoded body.
    /// Corruption or tampering.
    ChecksumMismatch,
    /// Input ended inside an envelope (strict decoding only).
    UnterminatedEnvelope,
    /// A header key or value cannot be represented in a header line.
    InvalidHeader,
    /// A requested block index does not exist in the decoded stream.
    BlockNotFound,
    /// Reading from the input source failed, including non-UTF-8 input.
    Read,
    /// Writing to the output sink failed.
    Write,
}

/// Expected and actual values behind a mismatch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct ArmorError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    /// Present for `ClosingTypeMismatch` (block tags) and `ChecksumMismatch`
    /// (hex-encoded checksums).
    pub mismatch: Option<Mismatch>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl ArmorError {
    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            mismatch: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            mismatch: None,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Creates a user error for a value that differed from what was expected.
    pub fn mismatch(
        kind: ErrorKind,
        msg: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            category: ErrorCategory::User,
            kind: Some(kind),
            mismatch: Some(Mismatch {
                expected: expected.into(),
                actual: actual.into(),
            }),
            source: None,
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        let mismatch = self.mismatch.clone();
        Self {
            category,
            kind,
            mismatch,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ArmorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_keeps_kind_and_mismatch() {
        let err = ArmorError::mismatch(
            ErrorKind::ChecksumMismatch,
            "checksum does not match",
            "9f150d",
            "9e350d",
        )
        .with_context("failed to dearmor input.asc");

        assert_eq!(err.message(), "failed to dearmor input.asc");
        assert_eq!(err.kind, Some(ErrorKind::ChecksumMismatch));
        assert_eq!(err.category, ErrorCategory::User);
        let mismatch = err.mismatch.as_ref().unwrap();
        assert_eq!(mismatch.expected, "9f150d");
        assert_eq!(mismatch.actual, "9e350d");

        let inner = err.source_error().unwrap();
        assert_eq!(inner.to_string(), "checksum does not match");
    }

    #[test]
    fn test_source_is_preserved() {
        let err = ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            "failed to write armor",
            io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        );

        assert_eq!(err.to_string(), "failed to write armor");
        assert_eq!(err.source_error().unwrap().to_string(), "pipe closed");
        assert!(err.mismatch.is_none());
    }
}
