//! Message delivery.
//!
//! Two real transports are available: [`SmtpTransport`](smtp::SmtpTransport)
//! speaks raw SMTP to a remote relay, [`SendmailTransport`](sendmail::SendmailTransport)
//! hands the message to the local MTA. [`StubTransport`](stub::StubTransport)
//! returns a canned result for tests.

use std::fmt::Display;

use crate::address::Envelope;

pub mod sendmail;
pub mod smtp;
pub mod stub;

/// Uniform delivery outcome surfaced to callers: a success flag and, on
/// failure, a human-readable error naming the failing stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendStatus {
    pub sent: bool,
    pub error: Option<String>,
}

impl SendStatus {
    pub fn success() -> Self {
        Self {
            sent: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            sent: false,
            error: Some(error.into()),
        }
    }
}

/// Blocking transport for composed messages.
pub trait Transport {
    /// Response produced by the transport
    type Ok;
    /// Error produced by the transport
    type Error: Display;

    /// Delivers the serialized header block and body to the envelope's
    /// recipients.
    fn send_raw(&self, envelope: &Envelope, headers: &str, body: &str)
        -> Result<Self::Ok, Self::Error>;

    /// Like [`Transport::send_raw`], folded into the uniform
    /// [`SendStatus`] result contract.
    fn status(&self, envelope: &Envelope, headers: &str, body: &str) -> SendStatus {
        match self.send_raw(envelope, headers, body) {
            Ok(_) => SendStatus::success(),
            Err(e) => SendStatus::failure(e.to_string()),
        }
    }
}
