//! The SMTP transport sends messages by speaking the protocol directly to a
//! relay server.
//!
//! It supports three connection modes (plain, `STARTTLS` upgrade, and
//! implicit TLS on connect) and optional `AUTH LOGIN` authentication.
//!
//! ```rust,no_run
//! use mailforge::{
//!     transport::{smtp::{Secure, SmtpConfig, SmtpTransport}, Transport},
//!     Address, Envelope,
//! };
//!
//! let transport = SmtpTransport::new(SmtpConfig {
//!     host: "smtp.example.com".to_owned(),
//!     secure: Secure::StartTls,
//!     auth: true,
//!     username: "user".to_owned(),
//!     password: "hunter2".to_owned(),
//!     ..SmtpConfig::default()
//! });
//!
//! let envelope = Envelope::new(
//!     Address::new("from@example.com", "Sender"),
//!     vec![Address::new("to@example.com", "")],
//! ).unwrap();
//! let status = transport.status(&envelope, "Subject: hi\r\n", "hello\r\n");
//! assert!(status.sent);
//! ```

use std::str::FromStr;

use crate::{address::Envelope, transport::Transport};

pub mod error;
mod net;
mod session;

pub use self::error::Error;
use self::session::SmtpSession;

/// Default SMTP port
pub const SMTP_PORT: u16 = 25;

/// Connection security mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Secure {
    /// Plain text connection
    #[default]
    None,
    /// Plain connection upgraded with `STARTTLS` before authenticating
    StartTls,
    /// TLS from the first byte (implicit TLS)
    Ssl,
}

impl FromStr for Secure {
    type Err = UnknownSecureMode;

    fn from_str(s: &str) -> Result<Secure, UnknownSecureMode> {
        match s {
            "none" | "" => Ok(Secure::None),
            "tls" => Ok(Secure::StartTls),
            "ssl" => Ok(Secure::Ssl),
            other => Err(UnknownSecureMode(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized security mode name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSecureMode(String);

impl std::fmt::Display for UnknownSecureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown security mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownSecureMode {}

/// Where and how to reach the relay server
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Server hostname, also used for TLS certificate verification
    pub host: String,
    /// Server port
    pub port: u16,
    /// Connection security mode
    pub secure: Secure,
    /// Whether to authenticate with `AUTH LOGIN`
    pub auth: bool,
    /// Username, sent base64 encoded when `auth` is set
    pub username: String,
    /// Password, sent base64 encoded when `auth` is set
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_owned(),
            port: SMTP_PORT,
            secure: Secure::None,
            auth: false,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Sends messages over SMTP
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    config: SmtpConfig,
}

impl SmtpTransport {
    /// Creates a new transport for the given server configuration.
    ///
    /// Nothing is connected until a message is sent; each delivery opens its
    /// own session and closes it after `QUIT`.
    pub fn new(config: SmtpConfig) -> SmtpTransport {
        SmtpTransport { config }
    }
}

impl Transport for SmtpTransport {
    type Ok = ();
    type Error = Error;

    fn send_raw(
        &self,
        envelope: &Envelope,
        headers: &str,
        body: &str,
    ) -> Result<Self::Ok, Self::Error> {
        let session = SmtpSession::open(&self.config)?;
        session.send(envelope, headers, body)
    }
}
