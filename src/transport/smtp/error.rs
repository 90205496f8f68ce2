//! Error and result type for the SMTP transport

use std::{error::Error as StdError, fmt};

use crate::BoxError;

/// The errors that may occur while delivering a message over SMTP
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

impl Error {
    fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the error happened while opening the connection
    pub fn is_connection(&self) -> bool {
        matches!(self.inner.kind, Kind::Connection)
    }

    /// Returns true if the error is from the TLS layer
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::Tls)
    }

    /// Returns true if the server replied with an unexpected code
    pub fn is_protocol(&self) -> bool {
        matches!(self.inner.kind, Kind::Protocol { .. })
    }

    /// The protocol stage that failed, if the error came from a server reply
    pub fn stage(&self) -> Option<&'static str> {
        match self.inner.kind {
            Kind::Protocol { stage } => Some(stage),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Kind {
    /// Opening the socket failed
    Connection,
    /// Underlying network i/o error
    Network,
    /// TLS negotiation or upgrade error
    Tls,
    /// Unexpected or negative server reply at a protocol stage
    Protocol { stage: &'static str },
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("mailforge::transport::smtp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Connection => f.write_str("could not connect to the server")?,
            Kind::Network => f.write_str("network error")?,
            Kind::Tls => f.write_str("TLS error")?,
            Kind::Protocol { stage } => write!(f, "SMTP error at stage '{stage}'")?,
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn StdError + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn connection<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connection, Some(e))
}

pub(crate) fn network<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Network, Some(e))
}

pub(crate) fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls, Some(e))
}

/// Protocol error carrying the failing stage and the raw server line.
pub(crate) fn protocol(stage: &'static str, line: impl Into<String>) -> Error {
    Error::new(Kind::Protocol { stage }, Some(line.into()))
}
