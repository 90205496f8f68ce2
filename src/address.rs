//! Email addresses and the MIME encoded-word codec used for headers.
// https://tools.ietf.org/html/rfc1522

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::Error;

/// A sender or recipient address.
///
/// The email part is assumed to be pre-validated by the caller; the display
/// name may contain arbitrary Unicode and is MIME-encoded before it ever
/// appears in a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    email: String,
    name: String,
}

impl Address {
    pub fn new<E: Into<String>, N: Into<String>>(email: E, name: N) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The domain part of the address, everything after the `@`.
    pub(crate) fn domain(&self) -> &str {
        self.email
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }
}

/// Simple email envelope: one sender, at least one recipient.
#[derive(Debug, Clone)]
pub struct Envelope {
    from: Address,
    to: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope. Fails when the recipient list is empty.
    pub fn new(from: Address, to: Vec<Address>) -> Result<Envelope, Error> {
        if to.is_empty() {
            return Err(Error::MissingTo);
        }
        Ok(Envelope { from, to })
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &[Address] {
        &self.to
    }
}

fn printable_ascii(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}

/// Replaces every byte outside printable ASCII with its own MIME encoded
/// word `=?UTF-8?B?<base64(byte)>?=`, leaving printable runs untouched.
///
/// The scan is byte-wise, not code-point-wise, so a multi-byte UTF-8
/// sequence becomes several consecutive encoded words. Kept for
/// compatibility with the historical wire output.
pub fn encode_non_ascii(text: &str) -> String {
    if text.bytes().all(printable_ascii) {
        return text.into();
    }

    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if printable_ascii(byte) {
            out.push(byte as char);
        } else {
            out.push_str("=?UTF-8?B?");
            out.push_str(&BASE64.encode([byte]));
            out.push_str("?=");
        }
    }
    out
}

/// Wraps the whole string as a single MIME encoded word, unconditionally,
/// even for pure ASCII. Used for Subject and display names.
pub fn encode_mime_header(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", BASE64.encode(text))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{encode_mime_header, encode_non_ascii, Address, Envelope};

    #[test]
    fn ascii_passes_through() {
        assert_eq!(&encode_non_ascii("Kayo. ?"), "Kayo. ?");
    }

    #[test]
    fn offending_bytes_encoded_individually() {
        // "é" is 0xC3 0xA9 in UTF-8: two bytes, two encoded words
        assert_eq!(
            &encode_non_ascii("caf\u{e9}s"),
            "caf=?UTF-8?B?ww==?==?UTF-8?B?qQ==?=s"
        );
    }

    #[test]
    fn control_bytes_encoded() {
        assert_eq!(&encode_non_ascii("a\tb"), "a=?UTF-8?B?CQ==?=b");
    }

    #[test]
    fn header_always_wrapped() {
        assert_eq!(&encode_mime_header("Hello"), "=?UTF-8?B?SGVsbG8=?=");
        assert_eq!(
            &encode_mime_header("Привет"),
            "=?UTF-8?B?0J/RgNC40LLQtdGC?="
        );
    }

    #[test]
    fn domain_from_email() {
        assert_eq!(Address::new("a@b.com", "A").domain(), "b.com");
        assert_eq!(Address::new("nodomain", "A").domain(), "");
    }

    #[test]
    fn envelope_requires_recipient() {
        assert!(Envelope::new(Address::new("a@b.com", ""), vec![]).is_err());
    }
}
