use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that ended a research run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required model call failed after all retries.
    OracleUnavailable,
    /// The page to analyze could not be fetched.
    SourceUnavailable,
    /// The run was aborted or ran past its deadline.
    Cancelled,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::OracleUnavailable => write!(f, "Oracle unavailable"),
            ErrorKind::SourceUnavailable => write!(f, "Source unavailable"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Describes why a research run or an article analysis failed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `OracleUnavailable` kind.
    #[inline]
    pub fn oracle_unavailable() -> Self {
        Self {
            kind: ErrorKind::OracleUnavailable,
            reason: None,
        }
    }

    /// Creates a new error with the `SourceUnavailable` kind.
    #[inline]
    pub fn source_unavailable() -> Self {
        Self {
            kind: ErrorKind::SourceUnavailable,
            reason: None,
        }
    }

    /// Creates a new error with the `Cancelled` kind.
    #[inline]
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::oracle_unavailable();
        assert_eq!(err.to_string(), "Oracle unavailable");
        assert_eq!(err.reason(), "Oracle unavailable");

        let err = Error::source_unavailable().with_reason("404 Not Found");
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert_eq!(err.to_string(), "Source unavailable: 404 Not Found");
        assert_eq!(err.reason(), "404 Not Found");
    }
}
