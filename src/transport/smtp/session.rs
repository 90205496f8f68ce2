use std::{
    io::{BufRead, BufReader, Write},
    mem,
    time::Duration,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use super::{
    error::{self, Error},
    net::NetworkStream,
    Secure, SmtpConfig,
};
use crate::address::Envelope;

/// Bound on the connect attempt, also installed as the socket's read and
/// write timeout so a stalled server cannot hang a delivery forever.
pub(super) const NET_TIMEOUT: Duration = Duration::from_secs(30);

/// One SMTP delivery, from greeting to `QUIT`.
///
/// The dialogue is driven as an explicit state machine: each state writes at
/// most one command, reads at most one reply line, and names the next state.
/// Any unexpected reply aborts the session with a protocol error carrying
/// the stage name and the raw server line.
pub(super) struct SmtpSession<'a> {
    stream: BufReader<NetworkStream>,
    config: &'a SmtpConfig,
}

/// Protocol stages, in wire order. Optional stages (`SslUpgrade`,
/// `StartTls`/`EhloAgain`, the `AUTH LOGIN` triple) are skipped according to
/// the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Greeting,
    SslUpgrade,
    Ehlo,
    StartTls,
    EhloAgain,
    AuthLogin,
    Username,
    Password,
    MailFrom,
    Rcpt(usize),
    Data,
    Payload,
    Quit,
    Done,
}

impl<'a> SmtpSession<'a> {
    /// Connects to the configured server. No protocol traffic happens here;
    /// the greeting is consumed by the first [`State::Greeting`] step.
    pub(super) fn open(config: &'a SmtpConfig) -> Result<SmtpSession<'a>, Error> {
        let stream = NetworkStream::connect(&config.host, config.port, NET_TIMEOUT)?;
        debug!(host = %config.host, port = config.port, "connected");
        Ok(SmtpSession {
            stream: BufReader::new(stream),
            config,
        })
    }

    /// Runs the full dialogue and delivers the message. The connection is
    /// dropped (and thereby closed) when the session goes out of scope.
    pub(super) fn send(mut self, envelope: &Envelope, headers: &str, body: &str) -> Result<(), Error> {
        let mut state = State::Greeting;
        while state != State::Done {
            state = self.step(state, envelope, headers, body)?;
        }
        Ok(())
    }

    fn step(
        &mut self,
        state: State,
        envelope: &Envelope,
        headers: &str,
        body: &str,
    ) -> Result<State, Error> {
        match state {
            State::Greeting => {
                self.read_greeting()?;
                Ok(match self.config.secure {
                    Secure::Ssl => State::SslUpgrade,
                    _ => State::Ehlo,
                })
            }
            State::SslUpgrade => {
                self.upgrade_tls()?;
                Ok(State::Ehlo)
            }
            State::Ehlo => {
                self.command("EHLO", &format!("EHLO {}\r\n", client_id()))?;
                Ok(match self.config.secure {
                    Secure::StartTls => State::StartTls,
                    _ => self.after_ehlo(),
                })
            }
            State::StartTls => {
                self.command("STARTTLS", "STARTTLS\r\n")?;
                self.upgrade_tls()?;
                Ok(State::EhloAgain)
            }
            State::EhloAgain => {
                self.command(
                    "EHLO (after STARTTLS)",
                    &format!("EHLO {}\r\n", client_id()),
                )?;
                Ok(self.after_ehlo())
            }
            State::AuthLogin => {
                self.command("AUTH LOGIN", "AUTH LOGIN\r\n")?;
                Ok(State::Username)
            }
            State::Username => {
                let encoded = BASE64.encode(&self.config.username);
                self.command("username", &format!("{encoded}\r\n"))?;
                Ok(State::Password)
            }
            State::Password => {
                let encoded = BASE64.encode(&self.config.password);
                self.command("password", &format!("{encoded}\r\n"))?;
                Ok(State::MailFrom)
            }
            State::MailFrom => {
                self.command(
                    "MAIL FROM",
                    &format!("MAIL FROM:<{}>\r\n", envelope.from().email()),
                )?;
                Ok(State::Rcpt(0))
            }
            State::Rcpt(i) => {
                let rcpt = &envelope.to()[i];
                self.command("RCPT TO", &format!("RCPT TO:<{}>\r\n", rcpt.email()))?;
                Ok(if i + 1 < envelope.to().len() {
                    State::Rcpt(i + 1)
                } else {
                    State::Data
                })
            }
            State::Data => {
                self.command("DATA", "DATA\r\n")?;
                Ok(State::Payload)
            }
            State::Payload => {
                self.write(headers)?;
                self.write("\r\n")?;
                self.write(body)?;
                self.write("\r\n.\r\n")?;
                self.read_reply("message body")?;
                Ok(State::Quit)
            }
            State::Quit => {
                // Fire and forget: the reply to QUIT is not awaited, closing
                // the socket ends the session on our side.
                self.write("QUIT\r\n")?;
                Ok(State::Done)
            }
            State::Done => Ok(State::Done),
        }
    }

    fn after_ehlo(&self) -> State {
        if self.config.auth {
            State::AuthLogin
        } else {
            State::MailFrom
        }
    }

    /// Writes one command line and validates the single reply line.
    fn command(&mut self, stage: &'static str, line: &str) -> Result<(), Error> {
        self.write(line)?;
        self.read_reply(stage)?;
        Ok(())
    }

    fn write(&mut self, data: &str) -> Result<(), Error> {
        debug!(">> {}", escape_crlf(data));
        let stream = self.stream.get_mut();
        stream.write_all(data.as_bytes()).map_err(error::network)?;
        stream.flush().map_err(error::network)
    }

    /// Reads one reply line and accepts it iff it starts with `250` or `354`.
    fn read_reply(&mut self, stage: &'static str) -> Result<String, Error> {
        let line = self.read_line(stage)?;
        if line.starts_with("250") || line.starts_with("354") {
            Ok(line)
        } else {
            Err(error::protocol(stage, line.trim_end().to_owned()))
        }
    }

    /// Like [`Self::read_reply`], but the session-opening banner is a `220`.
    fn read_greeting(&mut self) -> Result<String, Error> {
        let line = self.read_line("greeting")?;
        if line.starts_with("220") || line.starts_with("250") || line.starts_with("354") {
            Ok(line)
        } else {
            Err(error::protocol("greeting", line.trim_end().to_owned()))
        }
    }

    fn read_line(&mut self, stage: &'static str) -> Result<String, Error> {
        let mut line = String::new();
        let read = self.stream.read_line(&mut line).map_err(error::network)?;
        if read == 0 {
            return Err(error::protocol(stage, "connection closed by the server"));
        }
        debug!("<< {}", escape_crlf(&line));
        Ok(line)
    }

    /// Swaps the plain stream for an encrypted one, in place. The buffer is
    /// rebuilt from the raw stream; nothing may sit in it across the
    /// upgrade, which holds because replies are read line by line.
    fn upgrade_tls(&mut self) -> Result<(), Error> {
        let buffered = mem::replace(
            &mut self.stream,
            BufReader::new(NetworkStream::Disconnected),
        );
        let upgraded = buffered.into_inner().upgrade_tls(&self.config.host)?;
        debug!(
            host = %self.config.host,
            encrypted = upgraded.is_encrypted(),
            "connection upgraded"
        );
        self.stream = BufReader::new(upgraded);
        Ok(())
    }
}

/// Name we introduce ourselves with in `EHLO`, the local hostname when it
/// can be determined.
fn client_id() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_owned())
}

fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}
