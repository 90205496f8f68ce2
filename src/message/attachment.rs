//! File attachments.

use std::{fs, path::PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::Error;

/// Everything except RFC 3986 unreserved characters gets percent-encoded
/// in `filename*` parameters.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Base64 line width for attachment bodies.
const BASE64_LINE_LEN: usize = 76;

/// A file to attach to a message.
///
/// Construction checks that the file exists; a vanished path yields `None`
/// and the attachment is silently dropped, matching the collection-time
/// filtering policy. The content is only read when the body is built.
#[derive(Debug, Clone)]
pub struct Attachment {
    path: PathBuf,
    filename: String,
}

impl Attachment {
    /// Attaches the file at `path`, using its base name as display name.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Option<Self> {
        let path = path.into();
        let filename = path.file_name()?.to_string_lossy().into_owned();
        Self::named(path, filename)
    }

    /// Attaches the file at `path` under an explicit display name.
    pub fn with_filename<P: Into<PathBuf>, S: Into<String>>(path: P, filename: S) -> Option<Self> {
        Self::named(path.into(), filename.into())
    }

    fn named(path: PathBuf, filename: String) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        Some(Self { path, filename })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Renders this attachment as one part of a multipart/mixed body.
    ///
    /// The file is read in full here; a file that disappeared since
    /// collection aborts the build with an IO error.
    pub(crate) fn render(&self, out: &mut String, boundary: &str) -> Result<(), Error> {
        let content = fs::read(&self.path)?;
        let mime_type = mime_guess::from_path(&self.path).first_or_octet_stream();
        let encoded_name: String =
            utf8_percent_encode(&self.filename, FILENAME_ENCODE_SET).collect();

        out.push_str("--");
        out.push_str(boundary);
        out.push_str("\r\n");
        out.push_str(&format!(
            "Content-Type: {mime_type}; name*=\"UTF-8''{encoded_name}\"\r\n"
        ));
        out.push_str(&format!(
            "Content-Disposition: attachment; filename*=\"UTF-8''{encoded_name}\"\r\n"
        ));
        out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        out.push_str(&chunk_base64(&content));
        out.push_str("\r\n\r\n");
        Ok(())
    }
}

/// Base64-encodes `data` and wraps the output at 76 columns, CRLF after
/// every chunk including the last.
fn chunk_base64(data: &[u8]) -> String {
    let encoded = BASE64.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LEN * 2 + 2);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LEN) {
        // chunks of an ASCII string are valid UTF-8
        out.push_str(std::str::from_utf8(chunk).unwrap());
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{chunk_base64, Attachment};

    #[test]
    fn missing_file_is_dropped() {
        assert!(Attachment::from_path("testdata/no-such-file.bin").is_none());
    }

    #[test]
    fn existing_file_keeps_basename() {
        let attachment = Attachment::from_path("testdata/hello.txt").unwrap();
        assert_eq!(attachment.filename(), "hello.txt");
    }

    #[test]
    fn chunking_width_and_terminator() {
        let encoded = chunk_base64(&[0xaa; 100]);
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        // 100 bytes -> 136 base64 chars -> a full line, a partial line,
        // and the empty tail after the final CRLF
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2], "");
    }

    #[test]
    fn unicode_filename_rendering() {
        let attachment =
            Attachment::with_filename("testdata/hello.txt", "r\u{e9}sum\u{e9}.txt").unwrap();
        let mut out = String::new();
        attachment.render(&mut out, "BOUNDARY").unwrap();

        assert!(out.contains(
            "Content-Disposition: attachment; filename*=\"UTF-8''r%C3%A9sum%C3%A9.txt\"\r\n"
        ));
        assert!(out.contains("Content-Type: text/plain; name*=\"UTF-8''r%C3%A9sum%C3%A9.txt\"\r\n"));
        assert!(out.contains("Content-Transfer-Encoding: base64\r\n\r\n"));
    }
}
