//! High level, fluent message sending facade.
//!
//! [`Emailer`] collects addressing, content and delivery settings through
//! chained setters, then [`Emailer::send`] composes the message and hands it
//! to a transport: SMTP when a server was configured with
//! [`Emailer::set_smtp`], the local `sendmail` binary otherwise. Every
//! failure mode, from a bad priority to a rejected `RCPT TO`, is folded into
//! the returned [`SendStatus`] instead of panicking or bubbling an error
//! type to the caller.
//!
//! ```rust,no_run
//! use mailforge::Emailer;
//!
//! let status = Emailer::new("service@example.com", "Example Service")
//!     .to("user@example.org")
//!     .subject("Welcome")
//!     .html_content("<h1>Hello</h1>")
//!     .send();
//! assert!(status.sent);
//! ```

use tracing::debug;

use crate::{
    address::{encode_non_ascii, Address, Envelope},
    message::{Attachment, MessageBuilder},
    transport::{sendmail::SendmailTransport, smtp::SmtpConfig, smtp::SmtpTransport},
    SendStatus, Transport,
};

/// Fluent builder-and-sender for a single message
#[derive(Debug, Clone)]
pub struct Emailer {
    from: Address,
    reply_to: String,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: String,
    plain: String,
    html: String,
    attachments: Vec<Attachment>,
    smtp: Option<SmtpConfig>,
    message_id: String,
    in_reply_to: String,
    references: Vec<String>,
    language: String,
    priority: Option<u8>,
    mailer: String,
    list_id: String,
    list_unsubscribe: String,
    list_subscribe: String,
    list_archive: String,
    confirmed_opt_in: Option<bool>,
    spam_status: String,
    organization: String,
    disposition_notification_to: String,
}

impl Emailer {
    /// Creates an emailer for the given sender.
    ///
    /// Non-ASCII bytes in the sender address are MIME-encoded up front so
    /// the address is wire-safe everywhere it appears. Reply-To defaults to
    /// the sender address until overridden.
    pub fn new<E: Into<String>, N: Into<String>>(from_email: E, from_name: N) -> Emailer {
        let email = encode_non_ascii(&from_email.into());
        Emailer {
            reply_to: email.clone(),
            from: Address::new(email, from_name),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: String::new(),
            plain: String::new(),
            html: String::new(),
            attachments: Vec::new(),
            smtp: None,
            message_id: String::new(),
            in_reply_to: String::new(),
            references: Vec::new(),
            language: String::new(),
            priority: None,
            mailer: String::new(),
            list_id: String::new(),
            list_unsubscribe: String::new(),
            list_subscribe: String::new(),
            list_archive: String::new(),
            confirmed_opt_in: None,
            spam_status: String::new(),
            organization: String::new(),
            disposition_notification_to: String::new(),
        }
    }

    /// Adds a recipient.
    pub fn to<E: Into<String>>(mut self, email: E) -> Emailer {
        self.to
            .push(Address::new(encode_non_ascii(&email.into()), ""));
        self
    }

    /// Adds a carbon-copy recipient.
    pub fn cc<E: Into<String>>(mut self, email: E) -> Emailer {
        self.cc
            .push(Address::new(encode_non_ascii(&email.into()), ""));
        self
    }

    /// Adds a blind carbon-copy recipient.
    pub fn bcc<E: Into<String>>(mut self, email: E) -> Emailer {
        self.bcc
            .push(Address::new(encode_non_ascii(&email.into()), ""));
        self
    }

    /// Overrides the Reply-To address.
    pub fn reply_to<E: Into<String>>(mut self, email: E) -> Emailer {
        self.reply_to = encode_non_ascii(&email.into());
        self
    }

    /// Sets the subject line.
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Emailer {
        self.subject = subject.into();
        self
    }

    /// Sets the plain text part. When left empty and HTML content is
    /// present, a tag-stripped fallback is derived from the HTML.
    pub fn plain_text<S: Into<String>>(mut self, plain: S) -> Emailer {
        self.plain = plain.into();
        self
    }

    /// Sets the HTML part.
    pub fn html_content<S: Into<String>>(mut self, html: S) -> Emailer {
        self.html = html.into();
        self
    }

    /// Attaches the file at `path`, keeping its base name. Paths that do not
    /// point at a readable file are skipped.
    pub fn attachment<P: Into<std::path::PathBuf>>(mut self, path: P) -> Emailer {
        let path = path.into();
        match Attachment::from_path(&path) {
            Some(attachment) => self.attachments.push(attachment),
            None => debug!(path = %path.display(), "skipping missing attachment"),
        }
        self
    }

    /// Attaches the file at `path` under a different filename.
    pub fn attachment_as<P: Into<std::path::PathBuf>, S: Into<String>>(
        mut self,
        path: P,
        filename: S,
    ) -> Emailer {
        let path = path.into();
        match Attachment::with_filename(&path, filename) {
            Some(attachment) => self.attachments.push(attachment),
            None => debug!(path = %path.display(), "skipping missing attachment"),
        }
        self
    }

    /// Delivers over SMTP with the given configuration instead of the local
    /// `sendmail` binary.
    pub fn set_smtp(mut self, config: SmtpConfig) -> Emailer {
        self.smtp = Some(config);
        self
    }

    /// Sets the Message-ID, without angle brackets.
    pub fn message_id<S: Into<String>>(mut self, id: S) -> Emailer {
        self.message_id = id.into();
        self
    }

    /// Sets the parent message for threading; the sender's domain is
    /// appended on the wire.
    pub fn in_reply_to<S: Into<String>>(mut self, id: S) -> Emailer {
        self.in_reply_to = id.into();
        self
    }

    /// Adds a References entry; the sender's domain is appended on the wire.
    pub fn reference<S: Into<String>>(mut self, id: S) -> Emailer {
        self.references.push(id.into());
        self
    }

    /// Sets the Content-Language header.
    pub fn language<S: Into<String>>(mut self, language: S) -> Emailer {
        self.language = language.into();
        self
    }

    /// Sets X-Priority. Values outside 1..=3 make [`Emailer::send`] fail
    /// before any network traffic.
    pub fn priority(mut self, priority: u8) -> Emailer {
        self.priority = Some(priority);
        self
    }

    /// Overrides the X-Mailer identification.
    pub fn mailer<S: Into<String>>(mut self, mailer: S) -> Emailer {
        self.mailer = mailer.into();
        self
    }

    /// Sets the List-Id header.
    pub fn list_id<S: Into<String>>(mut self, value: S) -> Emailer {
        self.list_id = value.into();
        self
    }

    /// Sets the List-Unsubscribe header.
    pub fn list_unsubscribe<S: Into<String>>(mut self, value: S) -> Emailer {
        self.list_unsubscribe = value.into();
        self
    }

    /// Sets the List-Subscribe header.
    pub fn list_subscribe<S: Into<String>>(mut self, value: S) -> Emailer {
        self.list_subscribe = value.into();
        self
    }

    /// Sets the List-Archive header.
    pub fn list_archive<S: Into<String>>(mut self, value: S) -> Emailer {
        self.list_archive = value.into();
        self
    }

    /// Marks the recipient as a confirmed opt-in (or explicitly not one).
    pub fn confirmed_opt_in(mut self, opt_in: bool) -> Emailer {
        self.confirmed_opt_in = Some(opt_in);
        self
    }

    /// Sets the X-Spam-Status header.
    pub fn spam_status<S: Into<String>>(mut self, value: S) -> Emailer {
        self.spam_status = value.into();
        self
    }

    /// Sets the Organization header.
    pub fn organization<S: Into<String>>(mut self, value: S) -> Emailer {
        self.organization = value.into();
        self
    }

    /// Sets the Disposition-Notification-To header.
    pub fn disposition_notification_to<S: Into<String>>(mut self, value: S) -> Emailer {
        self.disposition_notification_to = value.into();
        self
    }

    /// Composes the message and delivers it.
    ///
    /// Composition errors (invalid priority, unreadable attachment, missing
    /// recipients) short-circuit before any connection is opened; transport
    /// errors are reported the same way, so the caller always gets a
    /// [`SendStatus`].
    pub fn send(self) -> SendStatus {
        let builder = MessageBuilder::new(self.from.clone())
            .common_headers(&self.to, &self.subject, &self.cc, &self.bcc, &self.reply_to)
            .id_headers(&self.message_id, &self.in_reply_to, &self.references);

        let builder = match builder.general_headers(&self.language, self.priority, &self.mailer) {
            Ok(builder) => builder,
            Err(e) => return SendStatus::failure(e.to_string()),
        };

        let message = builder
            .list_headers(
                &self.list_id,
                &self.list_unsubscribe,
                &self.list_subscribe,
                &self.list_archive,
            )
            .misc_headers(
                self.confirmed_opt_in,
                &self.spam_status,
                &self.organization,
                &self.disposition_notification_to,
            )
            .build(&self.html, &self.plain, &self.attachments);

        let message = match message {
            Ok(message) => message,
            Err(e) => return SendStatus::failure(e.to_string()),
        };

        // Cc and Bcc recipients share the envelope with To; Bcc never shows
        // up in the headers beyond its own explicit line.
        let mut recipients = self.to;
        recipients.extend(self.cc);
        recipients.extend(self.bcc);
        let envelope = match Envelope::new(self.from, recipients) {
            Ok(envelope) => envelope,
            Err(e) => return SendStatus::failure(e.to_string()),
        };

        match self.smtp {
            Some(config) => {
                SmtpTransport::new(config).status(&envelope, message.headers(), message.body())
            }
            None => SendmailTransport::new().status(&envelope, message.headers(), message.body()),
        }
    }
}
