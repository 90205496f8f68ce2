use std::{
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

use mailforge::{Address, Envelope, Secure, SmtpConfig, SmtpTransport, Transport};

/// Minimal scripted SMTP server: single connection, one reply line per
/// command. `rcpt_reply` lets a test reject recipients.
fn spawn_server(rcpt_reply: &'static str) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut received = Vec::new();
        let mut in_data = false;

        writer.write_all(b"220 mail.test ESMTP\r\n").unwrap();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }

            if in_data {
                if line == ".\r\n" {
                    in_data = false;
                    writer.write_all(b"250 2.0.0 queued\r\n").unwrap();
                } else {
                    received.push(line);
                }
                continue;
            }

            received.push(line.clone());
            if line.starts_with("QUIT") {
                break;
            }
            let reply: &[u8] = if line.starts_with("DATA") {
                in_data = true;
                b"354 go ahead\r\n"
            } else if line.starts_with("RCPT TO") {
                rcpt_reply.as_bytes()
            } else {
                b"250 OK\r\n"
            };
            writer.write_all(reply).unwrap();
        }

        received
    });

    (port, handle)
}

fn envelope() -> Envelope {
    Envelope::new(
        Address::new("from@example.com", "From"),
        vec![
            Address::new("to@example.com", ""),
            Address::new("other@example.com", ""),
        ],
    )
    .unwrap()
}

#[test]
fn plain_session_with_auth_delivers_message() {
    let (port, server) = spawn_server("250 OK\r\n");

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        secure: Secure::None,
        auth: true,
        username: "user".to_owned(),
        password: "pass".to_owned(),
    });

    transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap();

    let received = server.join().unwrap();
    assert!(received[0].starts_with("EHLO "));
    assert_eq!(received[1], "AUTH LOGIN\r\n");
    // base64("user"), base64("pass")
    assert_eq!(received[2], "dXNlcg==\r\n");
    assert_eq!(received[3], "cGFzcw==\r\n");
    assert_eq!(received[4], "MAIL FROM:<from@example.com>\r\n");
    assert_eq!(received[5], "RCPT TO:<to@example.com>\r\n");
    assert_eq!(received[6], "RCPT TO:<other@example.com>\r\n");
    assert_eq!(received[7], "DATA\r\n");
    assert!(received.contains(&"Subject: hi\r\n".to_owned()));
    assert!(received.contains(&"hello\r\n".to_owned()));
    assert_eq!(received.last().unwrap(), "QUIT\r\n");
}

#[test]
fn anonymous_session_skips_auth() {
    let (port, server) = spawn_server("250 OK\r\n");

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        ..SmtpConfig::default()
    });

    transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap();

    let received = server.join().unwrap();
    assert!(received[0].starts_with("EHLO "));
    assert_eq!(received[1], "MAIL FROM:<from@example.com>\r\n");
    assert!(!received.iter().any(|line| line.starts_with("AUTH")));
}

#[test]
fn rejected_recipient_aborts_before_data() {
    let (port, server) = spawn_server("550 5.1.1 no such user\r\n");

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        ..SmtpConfig::default()
    });

    let err = transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap_err();

    assert!(err.is_protocol());
    assert_eq!(err.stage(), Some("RCPT TO"));
    let rendered = err.to_string();
    assert!(rendered.contains("RCPT TO"), "{rendered}");
    assert!(rendered.contains("550"), "{rendered}");

    let received = server.join().unwrap();
    assert!(!received.iter().any(|line| line.starts_with("DATA")));
}

/// Scripted server for the STARTTLS leg: greeting, one reply to EHLO, the
/// given reply to STARTTLS, then the connection is dropped. The server
/// never speaks TLS, so an accepted STARTTLS always fails the handshake.
fn spawn_starttls_server(starttls_reply: &'static str) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut received = Vec::new();

        writer.write_all(b"220 mail.test ESMTP\r\n").unwrap();
        for reply in ["250 mail.test\r\n", starttls_reply] {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            received.push(line);
            writer.write_all(reply.as_bytes()).unwrap();
        }

        received
    });

    (port, handle)
}

#[test]
fn starttls_is_sent_after_ehlo_and_upgrades_the_stream() {
    let (port, server) = spawn_starttls_server("250 go ahead\r\n");

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        secure: Secure::StartTls,
        ..SmtpConfig::default()
    });

    // The server accepts STARTTLS but cannot complete a handshake, so the
    // session must die in the TLS layer, after the upgrade began.
    let err = transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap_err();
    assert!(err.is_tls(), "{err}");

    let received = server.join().unwrap();
    assert!(received[0].starts_with("EHLO "));
    assert_eq!(received[1], "STARTTLS\r\n");
}

#[test]
fn starttls_reply_must_be_250() {
    // Some servers answer STARTTLS with 220; only 250 and 354 are accepted.
    let (port, server) = spawn_starttls_server("220 ready\r\n");

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        secure: Secure::StartTls,
        ..SmtpConfig::default()
    });

    let err = transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap_err();

    assert!(err.is_protocol());
    assert_eq!(err.stage(), Some("STARTTLS"));
    assert!(err.to_string().contains("220"), "{err}");

    let received = server.join().unwrap();
    assert_eq!(received.last().unwrap(), "STARTTLS\r\n");
}

#[test]
fn ssl_mode_reads_the_greeting_then_wraps() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"220 mail.test ESMTP\r\n").unwrap();
        // Whatever arrives next is the client's TLS handshake, not SMTP.
        // One read, then hang up so the handshake dies promptly.
        let mut buf = [0u8; 1024];
        let read = std::io::Read::read(&mut stream, &mut buf).unwrap_or(0);
        buf[..read].to_vec()
    });

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        secure: Secure::Ssl,
        ..SmtpConfig::default()
    });

    let err = transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap_err();
    assert!(err.is_tls(), "{err}");

    let bytes = handle.join().unwrap();
    assert!(!bytes.is_empty());
    assert!(!bytes.starts_with(b"EHLO"));
}

#[test]
fn connection_refused_is_a_connection_error() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let transport = SmtpTransport::new(SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port,
        ..SmtpConfig::default()
    });

    let err = transport
        .send_raw(&envelope(), "Subject: hi\r\n", "hello\r\n")
        .unwrap_err();
    assert!(err.is_connection());
}
