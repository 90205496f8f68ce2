//! Message construction: an ordered header accumulator plus the multipart
//! body algorithm.
//!
//! A [`MessageBuilder`] is created per message, fed header groups in call
//! order, and finalized exactly once with [`MessageBuilder::build`], which
//! consumes it. The resulting [`Message`] carries the serialized header
//! block and body and is never reused across sends.
//!
//! ```rust
//! use mailforge::{Address, MessageBuilder};
//!
//! # fn main() -> Result<(), mailforge::Error> {
//! let message = MessageBuilder::new(Address::new("nobody@domain.tld", "NoBody"))
//!     .common_headers(
//!         &[Address::new("hei@domain.tld", "Hei")],
//!         "Happy new year",
//!         &[],
//!         &[],
//!         "nobody@domain.tld",
//!     )
//!     .build("", "Be happy!", &[])?;
//! # let _ = message;
//! # Ok(())
//! # }
//! ```

pub use attachment::Attachment;
pub use headers::Headers;

mod attachment;
mod body;
mod headers;

use std::time::SystemTime;

use crate::{
    address::{encode_mime_header, Address},
    error::Error,
};

const MAILER: &str = concat!("mailforge/", env!("CARGO_PKG_VERSION"));

/// A builder for messages.
///
/// Headers are recorded in call order; X-Mailer and Content-Type are keyed
/// slots that serialize once, at their first-insertion position, with their
/// last-set value.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    from: Address,
    headers: Headers,
    alternative_boundary: String,
}

impl MessageBuilder {
    /// Creates a builder for a message from the given sender.
    pub fn new(from: Address) -> Self {
        Self {
            from,
            headers: Headers::new(),
            alternative_boundary: body::make_boundary(),
        }
    }

    /// Emits Date, From, To, Reply-To, Subject, optional Cc/Bcc and the
    /// keyed X-Mailer.
    pub fn common_headers(
        mut self,
        to: &[Address],
        subject: &str,
        cc: &[Address],
        bcc: &[Address],
        reply_to: &str,
    ) -> Self {
        self.headers
            .append("Date", httpdate::fmt_http_date(SystemTime::now()));
        self.headers.append(
            "From",
            format!(
                "{} <{}>",
                encode_mime_header(self.from.name()),
                self.from.email()
            ),
        );
        self.headers.append("To", join_addresses(to));
        self.headers.append("Reply-To", reply_to);
        self.headers.append("Subject", encode_mime_header(subject));
        if !cc.is_empty() {
            self.headers.append("Cc", join_addresses(cc));
        }
        if !bcc.is_empty() {
            self.headers.append("Bcc", join_addresses(bcc));
        }
        self.headers.set("X-Mailer", MAILER);
        self
    }

    /// Emits Message-ID and the threading headers.
    ///
    /// The threading domain is taken from the sender address, everything
    /// after the `@`.
    pub fn id_headers(mut self, message_id: &str, in_reply_to: &str, references: &[String]) -> Self {
        let domain = self.from.domain().to_owned();
        if !message_id.is_empty() {
            self.headers.append("Message-ID", format!("<{message_id}>"));
        }
        if !in_reply_to.is_empty() {
            self.headers
                .append("In-Reply-To", format!("<{in_reply_to}@{domain}>"));
        }
        if !references.is_empty() {
            let refs: Vec<String> = references
                .iter()
                .map(|r| format!("<{r}@{domain}>"))
                .collect();
            self.headers.append("References", refs.join(" "));
        }
        self
    }

    /// Emits Content-Language and X-Priority, and overwrites the keyed
    /// X-Mailer slot when `mailer` is non-empty.
    ///
    /// Fails before any I/O when the priority is outside 1..=3.
    pub fn general_headers(
        mut self,
        language: &str,
        priority: Option<u8>,
        mailer: &str,
    ) -> Result<Self, Error> {
        if !language.is_empty() {
            self.headers.append("Content-Language", language);
        }
        if let Some(priority) = priority {
            if !(1..=3).contains(&priority) {
                return Err(Error::InvalidPriority(priority));
            }
            self.headers.append("X-Priority", priority.to_string());
        }
        if !mailer.is_empty() {
            self.headers.set("X-Mailer", mailer);
        }
        Ok(self)
    }

    /// Emits the List-* headers, each wrapped in angle brackets, for
    /// non-empty inputs only.
    pub fn list_headers(
        mut self,
        list_id: &str,
        unsubscribe: &str,
        subscribe: &str,
        archive: &str,
    ) -> Self {
        for (name, value) in [
            ("List-Id", list_id),
            ("List-Unsubscribe", unsubscribe),
            ("List-Subscribe", subscribe),
            ("List-Archive", archive),
        ] {
            if !value.is_empty() {
                self.headers.append(name, format!("<{value}>"));
            }
        }
        self
    }

    /// Emits X-Confirmed-OptIn (only when explicitly set), X-Spam-Status,
    /// Organization and Disposition-Notification-To.
    pub fn misc_headers(
        mut self,
        confirmed_opt_in: Option<bool>,
        spam_status: &str,
        organization: &str,
        disposition_notification_to: &str,
    ) -> Self {
        if let Some(opt_in) = confirmed_opt_in {
            self.headers
                .append("X-Confirmed-OptIn", if opt_in { "Yes" } else { "No" });
        }
        for (name, value) in [
            ("X-Spam-Status", spam_status),
            ("Organization", organization),
            ("Disposition-Notification-To", disposition_notification_to),
        ] {
            if !value.is_empty() {
                self.headers.append(name, value);
            }
        }
        self
    }

    /// Assembles the body and finalizes the message.
    ///
    /// Appends MIME-Version, sets the keyed Content-Type for the outermost
    /// multipart and appends Content-Length with the body's byte length.
    /// Consuming the builder keeps a finalized message from being mutated
    /// or rebuilt.
    pub fn build(
        mut self,
        html: &str,
        plain: &str,
        attachments: &[Attachment],
    ) -> Result<Message, Error> {
        let body = body::assemble(&self.alternative_boundary, html, plain, attachments)?;

        self.headers.append("MIME-Version", "1.0");
        self.headers.set("Content-Type", body.content_type);
        self.headers
            .append("Content-Length", body.content.len().to_string());

        Ok(Message {
            headers: self.headers.to_string(),
            body: body.content,
        })
    }
}

fn join_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::email)
        .collect::<Vec<_>>()
        .join(",")
}

/// A composed message: CRLF-joined header lines and the multipart body.
#[derive(Debug, Clone)]
pub struct Message {
    headers: String,
    body: String,
}

impl Message {
    /// The serialized header block, one `Name: value` line per header,
    /// CRLF-terminated throughout.
    pub fn headers(&self) -> &str {
        &self.headers
    }

    /// The multipart body.
    pub fn body(&self) -> &str {
        &self.body
    }
}
