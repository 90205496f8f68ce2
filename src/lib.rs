//! Mailforge is a mailer library for Rust. It composes multipart MIME
//! messages and delivers them, either through a remote SMTP relay or the
//! local `sendmail` binary.
//!
//! ## Features
//!
//! This library contains the following features:
//!
//! * Multipart messages (plain text plus HTML, with attachments)
//! * MIME encoded-word headers for non-ASCII content
//! * Threading, list management and priority headers
//! * SMTP delivery with `STARTTLS`, implicit TLS and `AUTH LOGIN`
//! * `sendmail` delivery for hosts with a local MTA
//!
//! ## Example
//!
//! This example shows a basic email sent through a relay:
//!
//! ```rust,no_run
//! use mailforge::{transport::smtp::{Secure, SmtpConfig}, Emailer};
//!
//! let status = Emailer::new("nobody@domain.tld", "NoBody")
//!     .reply_to("yuin@domain.tld")
//!     .to("hei@domain.tld")
//!     .subject("Happy new year")
//!     .plain_text("Be happy!")
//!     .set_smtp(SmtpConfig {
//!         host: "smtp.domain.tld".to_owned(),
//!         secure: Secure::StartTls,
//!         ..SmtpConfig::default()
//!     })
//!     .send();
//!
//! match status.error {
//!     None => println!("Email sent successfully!"),
//!     Some(e) => panic!("Could not send email: {e}"),
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod address;
mod emailer;
mod error;
pub mod message;
pub mod transport;

pub use crate::{
    address::{encode_mime_header, encode_non_ascii, Address, Envelope},
    emailer::Emailer,
    error::Error,
    message::{Attachment, Headers, Message, MessageBuilder},
    transport::{
        sendmail::SendmailTransport,
        smtp::{Secure, SmtpConfig, SmtpTransport},
        stub::StubTransport,
        SendStatus, Transport,
    },
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
