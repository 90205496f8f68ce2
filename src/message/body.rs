//! Multipart body assembly.

use rand::RngCore;

use crate::{error::Error, message::attachment::Attachment};

/// Create a random MIME boundary: 128 bits from the thread CSPRNG,
/// hex-encoded.
pub(crate) fn make_boundary() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Best-effort plain-text fallback: drops everything between `<` and `>`.
/// Not a real HTML-to-text converter; entities are left as-is.
pub(crate) fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// A fully assembled body and the top-level Content-Type describing it.
pub(crate) struct AssembledBody {
    pub(crate) content: String,
    pub(crate) content_type: String,
}

/// Assembles the multipart body: a multipart/alternative block with plain
/// and optional HTML parts, wrapped in multipart/mixed when attachments
/// are present.
pub(crate) fn assemble(
    alternative_boundary: &str,
    html: &str,
    plain: &str,
    attachments: &[Attachment],
) -> Result<AssembledBody, Error> {
    let plain_fallback;
    let plain = if plain.is_empty() && !html.is_empty() {
        plain_fallback = strip_tags(html);
        &plain_fallback
    } else {
        plain
    };

    let mut body = String::new();
    plain_part(&mut body, alternative_boundary, plain);
    if !html.is_empty() {
        html_part(&mut body, alternative_boundary, html);
    }
    body.push_str(&format!("--{alternative_boundary}--\r\n"));

    if attachments.is_empty() {
        return Ok(AssembledBody {
            content_type: format!(
                "multipart/alternative; boundary=\"{alternative_boundary}\""
            ),
            content: body,
        });
    }

    // Attachments present: a fresh mixed boundary wraps the alternative
    // block plus one part per attachment.
    let mixed_boundary = make_boundary();
    let mut wrapped = format!(
        "--{mixed_boundary}\r\n\
         Content-Type: multipart/alternative; boundary=\"{alternative_boundary}\"\r\n\r\n"
    );
    wrapped.push_str(&body);
    for attachment in attachments {
        attachment.render(&mut wrapped, &mixed_boundary)?;
    }
    wrapped.push_str(&format!("--{mixed_boundary}--\r\n"));

    Ok(AssembledBody {
        content_type: format!("multipart/mixed; boundary=\"{mixed_boundary}\""),
        content: wrapped,
    })
}

fn plain_part(out: &mut String, boundary: &str, plain: &str) {
    out.push_str(&format!(
        "--{boundary}\r\n\
         Content-Type: text/plain; charset=UTF-8\r\n\
         Content-Transfer-Encoding: 7bit\r\n\r\n\
         {plain}\r\n\r\n"
    ));
}

fn html_part(out: &mut String, boundary: &str, html: &str) {
    out.push_str(&format!(
        "--{boundary}\r\n\
         Content-Type: text/html; charset=UTF-8\r\n\
         Content-Transfer-Encoding: quoted-printable\r\n\r\n\
         {}\r\n\r\n",
        quoted_printable::encode_to_str(html)
    ));
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{assemble, make_boundary, strip_tags};

    #[test]
    fn test_make_boundary() {
        let mut boundaries = std::collections::HashSet::with_capacity(1000);
        for _ in 0..1000 {
            boundaries.insert(make_boundary());
        }

        // Ensure there are no duplicates
        assert_eq!(1000, boundaries.len());

        // Ensure correct length
        for boundary in boundaries {
            assert_eq!(32, boundary.len());
        }
    }

    #[test]
    fn strip_tags_basic() {
        assert_eq!(strip_tags("<p>Hi</p>"), "Hi");
        assert_eq!(strip_tags("a <b>bold</b> move"), "a bold move");
        assert_eq!(strip_tags("no markup"), "no markup");
        // entities are not decoded
        assert_eq!(strip_tags("<p>a &amp; b</p>"), "a &amp; b");
    }

    #[test]
    fn alternative_body_layout() {
        let body = assemble("BOUNDARY", "<p>Hi</p>", "", &[]).unwrap();

        assert_eq!(
            body.content_type,
            "multipart/alternative; boundary=\"BOUNDARY\""
        );
        assert_eq!(
            body.content,
            concat!(
                "--BOUNDARY\r\n",
                "Content-Type: text/plain; charset=UTF-8\r\n",
                "Content-Transfer-Encoding: 7bit\r\n",
                "\r\n",
                "Hi\r\n",
                "\r\n",
                "--BOUNDARY\r\n",
                "Content-Type: text/html; charset=UTF-8\r\n",
                "Content-Transfer-Encoding: quoted-printable\r\n",
                "\r\n",
                "<p>Hi</p>\r\n",
                "\r\n",
                "--BOUNDARY--\r\n",
            )
        );
    }

    #[test]
    fn html_part_quoted_printable_round_trip() {
        let html = "<p>caf\u{e9} &amp; crème</p>";
        let body = assemble("BOUNDARY", html, "ignored", &[]).unwrap();

        let qp = body
            .content
            .split("Content-Transfer-Encoding: quoted-printable\r\n\r\n")
            .nth(1)
            .unwrap()
            .split("\r\n\r\n")
            .next()
            .unwrap();
        let decoded =
            quoted_printable::decode(qp, quoted_printable::ParseMode::Strict).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), html);
    }

    #[test]
    fn plain_only_body_has_single_part() {
        let body = assemble("BOUNDARY", "", "just text", &[]).unwrap();
        assert_eq!(body.content.matches("--BOUNDARY\r\n").count(), 1);
        assert!(body.content.ends_with("--BOUNDARY--\r\n"));
    }
}
