//! Errors returned by the synchronous requests of [`LatencyLearner`](crate::LatencyLearner).

use std::{
    error::Error,
    fmt::{Debug, Display},
    io,
};

/// Error returned by a synchronous request other than report generation.
#[derive(Debug)]
pub enum RequestError {
    /// The engine has been shut down and no longer processes requests.
    Stopped,
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for RequestError {}

/// Error returned by report generation. Span statistics are left untouched either way.
#[derive(Debug)]
pub enum ReportError {
    /// The engine has been shut down and no longer processes requests.
    Stopped,
    /// The report destination could not be created or written.
    Io(io::Error),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Stopped => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for ReportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<RequestError> for ReportError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Stopped => Self::Stopped,
        }
    }
}
